// SPDX-License-Identifier: Apache-2.0

// Example using the Parser with a re-assembly buffer, so strings and numbers
// split across chunks come back whole.

use sjp::{Error, EventKind, Frame, Parser, Status, MIN_STACK};

fn main() -> Result<(), Error> {
    env_logger::init();

    let chunks: [&[u8]; 5] = [
        br#"{"sensor": "temp"#,
        br#"erature", "readings": [21.5, 2"#,
        br#"2.25, -0.7"#,
        r#"5], "unit": "°C", "ok": tr"#.as_bytes(),
        br#"ue}"#,
    ];

    let mut stack = [Frame::Value; MIN_STACK];
    let mut buffer = [0u8; 64];
    let mut parser = Parser::new(&mut stack, Some(&mut buffer))?;

    let mut depth = 0usize;
    for piece in chunks {
        let mut chunk = piece.to_vec();
        let mut events = parser.feed(&mut chunk);
        loop {
            let event = events.next_event()?;
            if event.status == Status::More {
                break;
            }
            if matches!(event.kind, EventKind::ObjectEnd | EventKind::ArrayEnd) {
                depth = depth.saturating_sub(1);
            }
            let indent = "  ".repeat(depth);
            match event.kind {
                EventKind::Number => println!(
                    "{indent}{} {:?}",
                    event.kind.as_str(),
                    event.number.unwrap_or(f64::NAN)
                ),
                kind => println!("{indent}{} {}", kind.as_str(), event.text_str().unwrap_or("?")),
            }
            if matches!(event.kind, EventKind::ObjectBegin | EventKind::ArrayBegin) {
                depth += 1;
            }
        }
    }

    let mut events = parser.end_of_stream();
    while !events.next_event()?.is_end() {}
    parser.close()?;
    println!("Document complete");
    Ok(())
}
