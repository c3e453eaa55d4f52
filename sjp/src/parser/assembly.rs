// SPDX-License-Identifier: Apache-2.0

use super::RawEvent;
use crate::shared::{Span, Status};

/// Caller-supplied buffer that joins string and number fragments back into
/// whole values.
///
/// When a value does not fit, the buffer is handed out full as a
/// [`Status::Partial`] event and the bytes that did not fit are kept as a
/// *spill*: a span into the same chunk (or the restart buffer) that is
/// returned unchanged on the following call.
#[derive(Debug)]
pub(crate) struct Assembly<'s> {
    buf: &'s mut [u8],
    len: usize,
    /// The content went out with the last event; empty it on the next call.
    handed_out: bool,
    spill: Option<RawEvent>,
}

impl<'s> Assembly<'s> {
    pub fn new(buf: &'s mut [u8]) -> Self {
        Assembly {
            buf,
            len: 0,
            handed_out: false,
            spill: None,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.handed_out = false;
        self.spill = None;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has_spill(&self) -> bool {
        self.spill.is_some()
    }

    /// Drops content the caller has already seen and returns a pending
    /// spill, if any.
    pub fn resume(&mut self) -> Option<RawEvent> {
        if self.handed_out {
            self.len = 0;
            self.handed_out = false;
        }
        self.spill.take()
    }

    /// Adds a string or number fragment.
    ///
    /// Returns the event for the caller, or `None` when the fragment was
    /// absorbed and the lexer should be consulted again.
    pub fn absorb(&mut self, text: &[u8], event: RawEvent) -> Option<RawEvent> {
        let copied = self.append(text);
        if copied < text.len() {
            log::debug!(
                "assembly buffer full at {} bytes, spilling {}",
                self.len,
                text.len() - copied
            );
            self.spill = Some(event.skip(copied));
            return Some(self.hand_out(event.kind, Status::Partial, None));
        }
        match event.status {
            Status::Partial => None,
            Status::More => Some(RawEvent::more()),
            Status::Complete => Some(self.hand_out(event.kind, Status::Complete, event.number)),
        }
    }

    pub fn text(&self, span: Span) -> Option<&[u8]> {
        span.slice(self.buf.get(..self.len)?)
    }

    fn append(&mut self, text: &[u8]) -> usize {
        let take = text.len().min(self.buf.len() - self.len);
        let dst = self.buf.get_mut(self.len..self.len + take);
        if let (Some(dst), Some(src)) = (dst, text.get(..take)) {
            dst.copy_from_slice(src);
            self.len += take;
            return take;
        }
        0
    }

    fn hand_out(
        &mut self,
        kind: super::EventKind,
        status: Status,
        number: Option<f64>,
    ) -> RawEvent {
        self.handed_out = true;
        RawEvent {
            kind,
            status,
            span: Span::assembly(self.len),
            number,
        }
    }
}
