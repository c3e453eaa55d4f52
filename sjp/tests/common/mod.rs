// SPDX-License-Identifier: Apache-2.0

//! Script runner shared by the lexer and parser scenario tests.
//!
//! A script is a list of steps, each paired with the outputs it must produce.
//! `Feed` and `EndOfStream` steps pull exactly the listed outputs from the
//! cursor; a `Close` step expects a single `Closed` or `Fail` entry and resets
//! the lexer or parser afterwards. A script that does not end on `Close` must
//! still close cleanly.

#![allow(dead_code)]

use core::fmt::Debug;

use sjp::{
    ErrKind, Error, Event, EventKind, Frame, Lexer, Parser, Status, Token, TokenKind, MIN_STACK,
};

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Feed(&'static str),
    /// Input that is not valid UTF-8.
    Raw(&'static [u8]),
    EndOfStream,
    Close,
}

#[derive(Debug, Clone, Copy)]
pub enum Expect<K> {
    Out {
        status: Status,
        kind: K,
        text: &'static [u8],
        number: Option<f64>,
    },
    Fail(ErrKind),
    Closed,
}

pub fn ok<K>(kind: K, text: &'static str) -> Expect<K> {
    out(Status::Complete, kind, text)
}

pub fn more<K>(kind: K, text: &'static str) -> Expect<K> {
    out(Status::More, kind, text)
}

pub fn partial<K>(kind: K, text: &'static str) -> Expect<K> {
    out(Status::Partial, kind, text)
}

pub fn number<K>(kind: K, text: &'static str, value: f64) -> Expect<K> {
    Expect::Out {
        status: Status::Complete,
        kind,
        text: text.as_bytes(),
        number: Some(value),
    }
}

pub fn fail<K>(kind: ErrKind) -> Expect<K> {
    Expect::Fail(kind)
}

pub fn closed<K>() -> Expect<K> {
    Expect::Closed
}

fn out<K>(status: Status, kind: K, text: &'static str) -> Expect<K> {
    Expect::Out {
        status,
        kind,
        text: text.as_bytes(),
        number: None,
    }
}

/// Token or event as seen by the runner.
pub trait Output: Debug {
    type Kind: Copy + PartialEq + Debug;

    fn parts(&self) -> (Status, Self::Kind, &[u8], Option<f64>);
}

impl Output for Token<'_> {
    type Kind = TokenKind;

    fn parts(&self) -> (Status, TokenKind, &[u8], Option<f64>) {
        (self.status, self.kind, self.text, self.number)
    }
}

impl Output for Event<'_> {
    type Kind = EventKind;

    fn parts(&self) -> (Status, EventKind, &[u8], Option<f64>) {
        (self.status, self.kind, self.text, self.number)
    }
}

fn check<O: Output>(got: Result<O, Error>, want: &Expect<O::Kind>, step: usize, index: usize) {
    match (want, &got) {
        (
            Expect::Out {
                status,
                kind,
                text,
                number,
            },
            Ok(output),
        ) => {
            let (got_status, got_kind, got_text, got_number) = output.parts();
            assert_eq!(
                (got_status, got_kind),
                (*status, *kind),
                "step {step}, output {index}: {output:?}"
            );
            assert_eq!(
                got_text,
                *text,
                "step {step}, output {index}: text {:?}",
                String::from_utf8_lossy(got_text)
            );
            if let Some(value) = number {
                if cfg!(feature = "float") {
                    assert_eq!(got_number, Some(*value), "step {step}, output {index}");
                }
            }
        }
        (Expect::Fail(kind), Err(err)) => {
            assert_eq!(err.kind(), *kind, "step {step}, output {index}: {err}");
        }
        _ => panic!("step {step}, output {index}: expected {want:?}, got {got:?}"),
    }
}

fn check_close<K: Debug>(got: Result<(), Error>, expected: &[Expect<K>], step: usize) {
    match (expected, got) {
        ([Expect::Closed], Ok(())) => {}
        ([Expect::Fail(kind)], Err(err)) => assert_eq!(err.kind(), *kind, "close at step {step}"),
        (want, got) => panic!("close at step {step}: expected {want:?}, got {got:?}"),
    }
}

fn chunk(step: &Step) -> Vec<u8> {
    match step {
        Step::Feed(text) => text.as_bytes().to_vec(),
        Step::Raw(bytes) => bytes.to_vec(),
        Step::EndOfStream | Step::Close => Vec::new(),
    }
}

pub type LexerScript<'a> = &'a [(Step, Vec<Expect<TokenKind>>)];

pub fn run_lexer(script: LexerScript<'_>) {
    let mut lexer = Lexer::new();
    for (i, (step, expected)) in script.iter().enumerate() {
        let mut data = chunk(step);
        match step {
            Step::Close => {
                check_close(lexer.close(), expected, i);
                lexer.reset();
            }
            Step::EndOfStream => {
                let mut tokens = lexer.end_of_stream();
                for (j, want) in expected.iter().enumerate() {
                    check(tokens.next_token(), want, i, j);
                }
            }
            Step::Feed(_) | Step::Raw(_) => {
                let mut tokens = lexer.feed(&mut data);
                for (j, want) in expected.iter().enumerate() {
                    check(tokens.next_token(), want, i, j);
                }
            }
        }
    }
    if !matches!(script.last(), Some((Step::Close, _))) {
        assert!(lexer.close().is_ok(), "lexer did not close cleanly");
    }
}

pub type ParserScript<'a> = &'a [(Step, Vec<Expect<EventKind>>)];

/// Runs a parser script with a minimal nesting stack and, if `buffer` is
/// given, a re-assembly buffer of that many bytes.
pub fn run_parser(buffer: Option<usize>, script: ParserScript<'_>) {
    let mut stack = [Frame::Value; MIN_STACK];
    let mut storage = vec![0u8; buffer.unwrap_or(0)];
    let mut parser = Parser::new(&mut stack, buffer.map(|_| storage.as_mut_slice()))
        .expect("parser storage is valid");
    for (i, (step, expected)) in script.iter().enumerate() {
        let mut data = chunk(step);
        match step {
            Step::Close => {
                check_close(parser.close(), expected, i);
                parser.reset();
            }
            Step::EndOfStream => {
                let mut events = parser.end_of_stream();
                for (j, want) in expected.iter().enumerate() {
                    check(events.next_event(), want, i, j);
                }
            }
            Step::Feed(_) | Step::Raw(_) => {
                let mut events = parser.feed(&mut data);
                for (j, want) in expected.iter().enumerate() {
                    check(events.next_event(), want, i, j);
                }
            }
        }
    }
    if !matches!(script.last(), Some((Step::Close, _))) {
        assert!(parser.close().is_ok(), "parser did not close cleanly");
    }
}
