//! Fuzz the whole `Parser` against arbitrary chunked input; the only
//! property under test is that it never panics, regardless of how the
//! boundary gets split across feeds.
#[macro_use]
extern crate afl;

use multipart_sans_io::{Config, Event, Parser};

const BOUNDARY: &str = "boundary";

fn main() {
    fuzz!(|data: &[u8]| {
        let mut parser = Parser::new(Config::new(BOUNDARY).unwrap());

        for chunk in data.chunks(BOUNDARY.len()) {
            parser.feed(chunk);
            loop {
                match parser.next_event() {
                    Ok(Event::NeedData) => break,
                    Ok(Event::Finished) => return,
                    Ok(_) => continue,
                    Err(_) => return,
                }
            }
        }
    })
}
