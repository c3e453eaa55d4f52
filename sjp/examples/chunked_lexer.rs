// SPDX-License-Identifier: Apache-2.0

// Example feeding a document to the Lexer in small chunks, the way bytes
// would arrive from a socket or a UART.
//
// Run with RUST_LOG=trace to see the lexer state after every token.

use sjp::{Error, Lexer, Status, TokenKind};

fn main() -> Result<(), Error> {
    env_logger::init();

    let json = r#"{"name": "café 😀", "items": [1, 2.5e3, true, null]}"#.as_bytes();
    println!("Input: {}", String::from_utf8_lossy(json));
    println!("Chunk size: 7 bytes");
    println!();

    let mut lexer = Lexer::new();
    for piece in json.chunks(7) {
        // the lexer decodes escapes in place, so each chunk must be writable
        let mut chunk = piece.to_vec();
        let mut tokens = lexer.feed(&mut chunk);
        loop {
            let token = tokens.next_token()?;
            match (token.kind, token.status) {
                (TokenKind::None, Status::More) => break,
                (TokenKind::None, _) => {}
                (kind, status) => println!(
                    "  {:<8} {:<4} {:?}{}",
                    status.as_str(),
                    kind.as_str(),
                    String::from_utf8_lossy(token.text),
                    token.number.map(|n| format!(" = {n}")).unwrap_or_default()
                ),
            }
            if token.status == Status::More {
                break;
            }
        }
    }

    let mut tokens = lexer.end_of_stream();
    while !tokens.next_token()?.is_end_of_stream() {}
    lexer.close()?;

    println!();
    println!("Lexer finished at {}", lexer.position());
    Ok(())
}
