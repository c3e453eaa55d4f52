// SPDX-License-Identifier: Apache-2.0

//! Grammar-checking event parser on top of [`Lexer`].
//!
//! The parser keeps one [`Frame`] per open container on a caller-supplied
//! stack and turns tokens into [`Event`]s. Separators (`,` and `:`) are
//! consumed silently; object keys are reported as string events.
//!
//! Without a re-assembly buffer, strings and numbers that span chunks are
//! reported as fragments exactly as the lexer produces them. With one, the
//! fragments are joined and each value arrives as a single event, unless it
//! outgrows the buffer.

mod assembly;

use assembly::Assembly;

use crate::error::{ErrKind, Error, Position};
use crate::lexer::{Lexeme, Lexer, TokenKind, RESTART_SIZE};
use crate::shared::{Source, Span, Status};

/// Smallest nesting stack [`Parser::new`] accepts.
pub const MIN_STACK: usize = 16;

/// One entry of the parser's nesting stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frame {
    /// Bottom of the stack, expecting a top-level value.
    #[default]
    Value,
    /// A string or number is arriving in fragments.
    Partial,
    /// After `{`.
    ObjectNew,
    /// After a key, expecting `:`.
    ObjectKey,
    /// After `:`, expecting a value.
    ObjectColon,
    /// After a member value, expecting `,` or `}`.
    ObjectValue,
    /// After `,` in an object, expecting a key.
    ObjectNext,
    /// After `[`.
    ArrayNew,
    /// After an element, expecting `,` or `]`.
    ArrayItem,
    /// After `,` in an array, expecting a value.
    ArrayNext,
}

impl Frame {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Frame::Value => "VALUE",
            Frame::Partial => "PARTIAL",
            Frame::ObjectNew => "OBJ_NEW",
            Frame::ObjectKey => "OBJ_KEY",
            Frame::ObjectColon => "OBJ_COLON",
            Frame::ObjectValue => "OBJ_VALUE",
            Frame::ObjectNext => "OBJ_NEXT",
            Frame::ArrayNew => "ARR_NEW",
            Frame::ArrayItem => "ARR_ITEM",
            Frame::ArrayNext => "ARR_NEXT",
        }
    }

    /// The error reported when input ends inside this frame's container.
    const fn unclosed(self) -> Option<ErrKind> {
        match self {
            Frame::ObjectNew
            | Frame::ObjectKey
            | Frame::ObjectColon
            | Frame::ObjectValue
            | Frame::ObjectNext => Some(ErrKind::UnclosedObject),
            Frame::ArrayNew | Frame::ArrayItem | Frame::ArrayNext => Some(ErrKind::UnclosedArray),
            Frame::Value | Frame::Partial => None,
        }
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a parse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Nothing to report: more input is needed, or, with
    /// [`Status::Complete`], the stream ended cleanly.
    None,
    Null,
    True,
    False,
    /// A string value or an object key.
    String,
    Number,
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
}

impl EventKind {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::None => "NONE",
            EventKind::Null => "NULL",
            EventKind::True => "TRUE",
            EventKind::False => "FALSE",
            EventKind::String => "STR",
            EventKind::Number => "NUM",
            EventKind::ObjectBegin => "{",
            EventKind::ObjectEnd => "}",
            EventKind::ArrayBegin => "[",
            EventKind::ArrayEnd => "]",
        }
    }

    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            EventKind::Null
                | EventKind::True
                | EventKind::False
                | EventKind::String
                | EventKind::Number
        )
    }

    const fn from_scalar(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Null => Some(EventKind::Null),
            TokenKind::True => Some(EventKind::True),
            TokenKind::False => Some(EventKind::False),
            TokenKind::String => Some(EventKind::String),
            TokenKind::Number => Some(EventKind::Number),
            _ => None,
        }
    }
}

/// A parse event handed to the caller.
///
/// `text` is valid until the next call. Structural events carry their
/// delimiter as text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<'a> {
    pub kind: EventKind,
    pub status: Status,
    pub text: &'a [u8],
    /// Value of a complete number, when it converts to a finite `f64`.
    pub number: Option<f64>,
}

impl<'a> Event<'a> {
    /// The text as UTF-8, if a fragment boundary did not split a code point.
    pub fn text_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.text).ok()
    }

    /// True for the event that reports a clean end of stream.
    pub fn is_end(&self) -> bool {
        self.kind == EventKind::None && self.status == Status::Complete
    }
}

/// Event with its text still expressed as a [`Span`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawEvent {
    kind: EventKind,
    status: Status,
    span: Span,
    number: Option<f64>,
}

impl RawEvent {
    const fn more() -> Self {
        RawEvent {
            kind: EventKind::None,
            status: Status::More,
            span: Span::empty(),
            number: None,
        }
    }

    fn from_lexeme(kind: EventKind, lexeme: &Lexeme) -> Self {
        RawEvent {
            kind,
            status: lexeme.status,
            span: lexeme.span,
            number: lexeme.number,
        }
    }

    fn skip(self, n: usize) -> Self {
        RawEvent {
            span: self.span.skip(n),
            ..self
        }
    }
}

/// Streaming JSON parser with caller-supplied storage.
///
/// # Example
///
/// ```
/// use sjp::{EventKind, Frame, Parser, Status, MIN_STACK};
///
/// let mut stack = [Frame::Value; MIN_STACK];
/// let mut parser = Parser::new(&mut stack, None).unwrap();
///
/// let mut kinds = Vec::new();
/// for chunk in [&b"{\"a\": [tr"[..], &b"ue, 1"[..], &b"2]}"[..]] {
///     let mut data = chunk.to_vec();
///     let mut events = parser.feed(&mut data);
///     loop {
///         let event = events.next_event().unwrap();
///         if event.status == Status::More {
///             break;
///         }
///         kinds.push(event.kind);
///     }
/// }
/// parser.close().unwrap();
/// assert_eq!(
///     kinds,
///     [
///         EventKind::ObjectBegin,
///         EventKind::String,
///         EventKind::ArrayBegin,
///         EventKind::True,
///         EventKind::Number,
///         EventKind::ArrayEnd,
///         EventKind::ObjectEnd,
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct Parser<'s> {
    stack: &'s mut [Frame],
    /// Number of frames in use; the bottom `Value` frame is never popped.
    top: usize,
    lexer: Lexer,
    assembly: Option<Assembly<'s>>,
    /// New input was fed while a spill was pending.
    misfed: bool,
}

impl<'s> Parser<'s> {
    /// Creates a parser over a nesting stack of at least [`MIN_STACK`]
    /// frames and an optional re-assembly buffer longer than
    /// [`RESTART_SIZE`] bytes.
    pub fn new(stack: &'s mut [Frame], buffer: Option<&'s mut [u8]>) -> Result<Self, Error> {
        if stack.len() < MIN_STACK {
            log::debug!("nesting stack of {} frames is too small", stack.len());
            return Error::new(ErrKind::InvalidParams, Position::start(), &[]);
        }
        if let Some(buf) = &buffer {
            if buf.len() <= RESTART_SIZE {
                log::debug!("re-assembly buffer of {} bytes is too small", buf.len());
                return Error::new(ErrKind::InvalidParams, Position::start(), &[]);
            }
        }
        let mut parser = Parser {
            stack,
            top: 0,
            lexer: Lexer::new(),
            assembly: buffer.map(Assembly::new),
            misfed: false,
        };
        parser.reset();
        Ok(parser)
    }

    /// Returns the parser to its freshly constructed state, keeping its
    /// storage.
    pub fn reset(&mut self) {
        self.lexer.reset();
        if let Some(bottom) = self.stack.first_mut() {
            *bottom = Frame::Value;
            self.top = 1;
        }
        if let Some(assembly) = self.assembly.as_mut() {
            assembly.clear();
        }
        self.misfed = false;
    }

    /// Lends the next chunk of input to the parser.
    pub fn feed<'a>(&'a mut self, data: &'a mut [u8]) -> Events<'a, 's> {
        self.install(false);
        Events { parser: self, data }
    }

    /// Declares that no more input follows.
    ///
    /// The cursor delivers whatever the end of input completes, then either
    /// a complete [`EventKind::None`] event or the error for the innermost
    /// container left open.
    pub fn end_of_stream(&mut self) -> Events<'_, 's> {
        self.install(true);
        Events {
            parser: self,
            data: &mut [],
        }
    }

    /// Checks that the input ended on a value boundary.
    ///
    /// Reports an unterminated token first, then the innermost unclosed
    /// container. A number still waiting for its delimiter counts as
    /// finished, though its completion event is never delivered; use
    /// [`Parser::end_of_stream`] to receive it.
    pub fn close(&mut self) -> Result<(), Error> {
        if let Some(assembly) = self.assembly.as_mut() {
            assembly.clear();
        }
        self.misfed = false;
        self.lexer.close()?;
        if self.top_frame()? == Frame::Partial {
            self.pop()?;
        }
        if let Some(kind) = self.innermost_unclosed() {
            log::debug!("close with {} frames open: {kind}", self.top);
            return Error::new(kind, self.lexer.position(), &[]);
        }
        if self.top != 1 {
            return self.internal_error();
        }
        Ok(())
    }

    /// The frame on top of the stack.
    pub fn state(&self) -> Frame {
        self.top_frame().unwrap_or_default()
    }

    /// Number of stack frames in use, including the bottom one.
    pub fn depth(&self) -> usize {
        self.top
    }

    pub fn is_buffered(&self) -> bool {
        self.assembly.is_some()
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// Installs new input; a spill still pending at this point is lost, so
    /// the next event reports the misuse.
    fn install(&mut self, eos: bool) {
        if self.assembly.as_ref().is_some_and(|a| a.has_spill()) {
            log::warn!("new input installed before the spilled value was returned");
            self.misfed = true;
        }
        self.lexer.install(eos);
    }

    fn next(&mut self, data: &mut [u8]) -> Result<RawEvent, Error> {
        if core::mem::take(&mut self.misfed) {
            if let Some(assembly) = self.assembly.as_mut() {
                assembly.clear();
            }
            return Error::new(ErrKind::InvalidParams, self.lexer.position(), &[]);
        }
        if let Some(spilled) = self.assembly.as_mut().and_then(Assembly::resume) {
            return Ok(spilled);
        }

        loop {
            let frame = self.top_frame()?;
            let lexeme = self.lexer.lex(data)?;
            if lexeme.status == Status::More && lexeme.kind == TokenKind::None {
                return Ok(RawEvent::more());
            }
            if lexeme.kind == TokenKind::EndOfStream {
                return self.end_of_input();
            }

            let event = match frame {
                Frame::Value => self.value(data, &lexeme)?,
                Frame::Partial => {
                    let Some(kind) = EventKind::from_scalar(lexeme.kind) else {
                        return self.internal_error();
                    };
                    if lexeme.status == Status::Complete {
                        self.pop()?;
                    }
                    RawEvent::from_lexeme(kind, &lexeme)
                }
                Frame::ObjectNew if lexeme.kind == TokenKind::ObjectClose => {
                    self.pop()?;
                    RawEvent::from_lexeme(EventKind::ObjectEnd, &lexeme)
                }
                Frame::ObjectNew | Frame::ObjectNext => {
                    if lexeme.kind != TokenKind::String {
                        return self.reject(ErrKind::InvalidKey, data, &lexeme);
                    }
                    self.set(Frame::ObjectKey);
                    if lexeme.status != Status::Complete {
                        self.push(Frame::Partial)?;
                    }
                    RawEvent::from_lexeme(EventKind::String, &lexeme)
                }
                Frame::ObjectKey => {
                    if lexeme.kind != TokenKind::Colon {
                        return self.reject(ErrKind::InvalidInput, data, &lexeme);
                    }
                    self.set(Frame::ObjectColon);
                    continue;
                }
                Frame::ObjectColon => {
                    self.set(Frame::ObjectValue);
                    self.value(data, &lexeme)?
                }
                Frame::ObjectValue => match lexeme.kind {
                    TokenKind::Comma => {
                        self.set(Frame::ObjectNext);
                        continue;
                    }
                    TokenKind::ObjectClose => {
                        self.pop()?;
                        RawEvent::from_lexeme(EventKind::ObjectEnd, &lexeme)
                    }
                    _ => return self.reject(ErrKind::InvalidInput, data, &lexeme),
                },
                Frame::ArrayNew if lexeme.kind == TokenKind::ArrayClose => {
                    self.pop()?;
                    RawEvent::from_lexeme(EventKind::ArrayEnd, &lexeme)
                }
                Frame::ArrayNew | Frame::ArrayNext => {
                    self.set(Frame::ArrayItem);
                    self.value(data, &lexeme)?
                }
                Frame::ArrayItem => match lexeme.kind {
                    TokenKind::Comma => {
                        self.set(Frame::ArrayNext);
                        continue;
                    }
                    TokenKind::ArrayClose => {
                        self.pop()?;
                        RawEvent::from_lexeme(EventKind::ArrayEnd, &lexeme)
                    }
                    _ => return self.reject(ErrKind::InvalidInput, data, &lexeme),
                },
            };

            log::trace!(
                "{} {} in {}, depth {}",
                event.status,
                event.kind.as_str(),
                frame,
                self.top
            );
            if let Some(event) = self.assemble(data, event)? {
                return Ok(event);
            }
        }
    }

    /// Handles a token in a position where any value may start.
    fn value(&mut self, data: &[u8], lexeme: &Lexeme) -> Result<RawEvent, Error> {
        match lexeme.kind {
            TokenKind::ObjectOpen => {
                self.push(Frame::ObjectNew)?;
                Ok(RawEvent::from_lexeme(EventKind::ObjectBegin, lexeme))
            }
            TokenKind::ArrayOpen => {
                self.push(Frame::ArrayNew)?;
                Ok(RawEvent::from_lexeme(EventKind::ArrayBegin, lexeme))
            }
            kind => {
                let Some(kind) = EventKind::from_scalar(kind) else {
                    return self.reject(ErrKind::InvalidInput, data, lexeme);
                };
                if lexeme.status != Status::Complete {
                    self.push(Frame::Partial)?;
                }
                Ok(RawEvent::from_lexeme(kind, lexeme))
            }
        }
    }

    /// Routes string and number fragments through the re-assembly buffer.
    fn assemble(&mut self, data: &[u8], event: RawEvent) -> Result<Option<RawEvent>, Error> {
        let Some(assembly) = self.assembly.as_mut() else {
            return Ok(Some(event));
        };
        let passthrough = !matches!(event.kind, EventKind::String | EventKind::Number)
            || (event.status == Status::Complete && assembly.is_empty());
        if passthrough {
            return Ok(Some(event));
        }
        let text = self.lexer.resolve(data, event.span)?;
        Ok(assembly.absorb(text, event))
    }

    fn end_of_input(&mut self) -> Result<RawEvent, Error> {
        if self.top == 1 && self.top_frame()? == Frame::Value {
            return Ok(RawEvent {
                kind: EventKind::None,
                status: Status::Complete,
                span: Span::empty(),
                number: None,
            });
        }
        match self.innermost_unclosed() {
            Some(kind) => Error::new(kind, self.lexer.position(), &[]),
            None => self.internal_error(),
        }
    }

    fn innermost_unclosed(&self) -> Option<ErrKind> {
        self.stack
            .get(1..self.top)?
            .iter()
            .rev()
            .find_map(|frame| frame.unclosed())
    }

    fn top_frame(&self) -> Result<Frame, Error> {
        match self.top.checked_sub(1).and_then(|i| self.stack.get(i)) {
            Some(frame) => Ok(*frame),
            None => Error::new(ErrKind::InternalError, self.lexer.position(), &[]),
        }
    }

    fn set(&mut self, frame: Frame) {
        if let Some(slot) = self.top.checked_sub(1).and_then(|i| self.stack.get_mut(i)) {
            *slot = frame;
        }
    }

    fn push(&mut self, frame: Frame) -> Result<(), Error> {
        let Some(slot) = self.stack.get_mut(self.top) else {
            log::debug!("nesting stack full at {} frames", self.top);
            return Error::new(
                ErrKind::TooMuchNesting,
                self.lexer.token_position(),
                &[],
            );
        };
        *slot = frame;
        self.top += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Error> {
        if self.top <= 1 {
            return self.internal_error();
        }
        self.top -= 1;
        Ok(())
    }

    fn reject<T>(&self, kind: ErrKind, data: &[u8], lexeme: &Lexeme) -> Result<T, Error> {
        let text = self.lexer.resolve(data, lexeme.span).unwrap_or(&[]);
        Error::new(kind, self.lexer.token_position(), text)
    }

    fn internal_error<T>(&self) -> Result<T, Error> {
        log::error!("parser reached an impossible state at depth {}", self.top);
        Error::new(ErrKind::InternalError, self.lexer.position(), &[])
    }

    fn resolve<'a>(&'a self, data: &'a [u8], event: RawEvent) -> Result<Event<'a>, Error> {
        let text = match event.span.source {
            Source::Assembly => match self.assembly.as_ref().and_then(|a| a.text(event.span)) {
                Some(text) => text,
                None => return self.internal_error(),
            },
            Source::Input | Source::Restart => self.lexer.resolve(data, event.span)?,
        };
        Ok(Event {
            kind: event.kind,
            status: event.status,
            text,
            number: event.number,
        })
    }
}

/// Cursor over the events of one chunk.
pub struct Events<'a, 's> {
    parser: &'a mut Parser<'s>,
    data: &'a mut [u8],
}

impl<'s> Events<'_, 's> {
    /// Returns the next event or error.
    ///
    /// [`Status::More`] with [`EventKind::None`] means this chunk is used
    /// up. A `More` event of another kind is the last fragment this chunk
    /// holds. [`Status::Partial`] means call again before feeding.
    pub fn next_event(&mut self) -> Result<Event<'_>, Error> {
        let event = self.parser.next(&mut *self.data)?;
        self.parser.resolve(&*self.data, event)
    }

    pub fn parser(&self) -> &Parser<'s> {
        self.parser
    }
}
