// SPDX-License-Identifier: Apache-2.0

//! Restartable, allocation-free streaming JSON lexer and event parser.
//!
//! Input arrives in chunks of any size, split at any byte. Both layers work
//! on borrowed, caller-owned memory only:
//!
//! * [`Lexer`] turns chunks into tokens. Strings and numbers that cross a
//!   chunk boundary come back as fragments marked [`Status::More`] or
//!   [`Status::Partial`]; escapes are decoded in place.
//! * [`Parser`] checks the JSON grammar with a caller-supplied [`Frame`]
//!   stack and reports [`Event`]s. Given a re-assembly buffer it joins
//!   fragments into whole values.
//!
//! ```
//! use sjp::{Lexer, Status, TokenKind};
//!
//! let mut lexer = Lexer::new();
//! let mut first = br#"["caf\u00"#.to_vec();
//! let mut second = br#"e9", 4"#.to_vec();
//! let mut third = b"2]".to_vec();
//!
//! let mut text = Vec::new();
//! for chunk in [&mut first, &mut second, &mut third] {
//!     let mut tokens = lexer.feed(chunk);
//!     loop {
//!         let token = tokens.next_token().unwrap();
//!         if token.kind == TokenKind::String {
//!             text.extend_from_slice(token.text);
//!         }
//!         if token.status == Status::More {
//!             break;
//!         }
//!     }
//! }
//! lexer.close().unwrap();
//! assert_eq!(text, "café".as_bytes());
//! ```

#![cfg_attr(not(test), no_std)]

mod error;
pub use error::{ErrKind, Error, Excerpt, Position};

mod escape;

mod lexer;
pub use lexer::{LexState, Lexer, Num, Str, Token, TokenKind, Tokens, RESTART_SIZE};

mod number;

mod parser;
pub use parser::{Event, EventKind, Events, Frame, Parser, MIN_STACK};

mod shared;
pub use shared::Status;

mod utf8;
pub use utf8::{Utf8Decoder, Utf8Step};
