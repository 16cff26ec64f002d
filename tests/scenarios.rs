// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use multipart_sans_io::{Config, Error, Event, Parser, Session};

fn feed_all(parser: &mut Parser, chunks: &[&[u8]]) -> Vec<Event> {
    let mut events = Vec::new();
    for chunk in chunks {
        parser.feed(chunk);
        loop {
            match parser.next_event().expect("parse error") {
                Event::NeedData => break,
                Event::Finished => {
                    events.push(Event::Finished);
                    return events;
                }
                event => events.push(event),
            }
        }
    }
    events
}

fn assert_part(event: &Event, name: &str, filename: Option<&str>, content_type: Option<&str>) {
    match event {
        Event::Part(part) => {
            assert_eq!(part.name, name);
            assert_eq!(part.filename.as_deref(), filename);
            assert_eq!(part.content_type.as_ref().map(|m| m.essence_str()), content_type);
        }
        other => panic!("expected Part, got {:?}", other),
    }
}

fn assert_part_data(event: &Event, raw: &[u8]) {
    match event {
        Event::PartData(data) => {
            assert_eq!(data.raw, raw);
            assert_eq!(data.size, raw.len());
        }
        other => panic!("expected PartData, got {:?}", other),
    }
}

#[test]
fn heavily_fragmented_single_part() {
    let boundary = "8banana133744910kmmr13a56!102!2405";
    let chunks: &[&[u8]] = &[
        b"--8banana133744910kmmr",
        b"13a56!102!2405\r\nContent-Disposition: form-da",
        b"ta; name=\"file_1\"; filename=\"test_file1.tx",
        b"t\"\r\nContent-Type: application/octet-strea",
        b"m\r\ncontent-length: 9\r\n\r\nCompoo",
        b"per\r\n--8banana",
        b"133744910kmmr13a5",
        b"6!102!2405--\r\n",
    ];

    let mut parser = Parser::new(Config::new(boundary).unwrap());
    let events = feed_all(&mut parser, chunks);

    assert_part(&events[0], "file_1", Some("test_file1.txt"), Some("application/octet-stream"));

    let body: Vec<u8> = events[1..events.len() - 1]
        .iter()
        .flat_map(|e| match e {
            Event::PartData(d) => d.raw.clone(),
            other => panic!("expected PartData, got {:?}", other),
        })
        .collect();
    assert_eq!(body, b"Compooper".to_vec());

    assert!(matches!(events.last(), Some(Event::Finished)));
    assert!(parser.is_finished());
}

#[test]
fn two_parts_supplied_whole() {
    let boundary = "8banana133744910kmmr13a56!102!1823";
    let input: &[u8] = b"--8banana133744910kmmr13a56!102!1823\r\n\
        Content-Disposition: form-data; name=\"file_1\"; filename=\"test_file1.txt\"\r\n\
        Content-Type: application/octet-stream\r\n\
        \r\n\
        Compooper\r\n\
        --8banana133744910kmmr13a56!102!1823\r\n\
        Content-Disposition: form-data; name=\"data_1\"\r\n\
        \r\n\
        watwatwatwat=yesyesyes\r\n\
        --8banana133744910kmmr13a56!102!1823--\r\n";

    let mut parser = Parser::new(Config::new(boundary).unwrap());
    let events = parser.parse(input).unwrap();

    assert_part(&events[0], "file_1", Some("test_file1.txt"), Some("application/octet-stream"));
    assert_part_data(&events[1], b"Compooper");
    assert_part(&events[2], "data_1", None, None);
    assert_part_data(&events[3], b"watwatwatwat=yesyesyes");
    assert!(matches!(events[4], Event::Finished));
}

#[test]
fn empty_body_part() {
    let input: &[u8] = b"--boundary\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\n\r\n--boundary--\r\n";

    let mut parser = Parser::new(Config::new("boundary").unwrap());
    let events = parser.parse(input).unwrap();

    assert_part(&events[0], "x", None, None);
    let total_body_len: usize = events[1..events.len() - 1]
        .iter()
        .map(|e| match e {
            Event::PartData(d) => d.size,
            other => panic!("expected PartData, got {:?}", other),
        })
        .sum();
    assert_eq!(total_body_len, 0);
    assert!(matches!(events.last(), Some(Event::Finished)));
}

#[test]
fn missing_name_is_malformed_data() {
    let input: &[u8] =
        b"--boundary\r\nContent-Disposition: form-data\r\n\r\nsome data\r\n--boundary--";

    let mut parser = Parser::new(Config::new("boundary").unwrap());
    let result = parser.parse(input);

    assert!(matches!(result, Err(Error::MalformedData(_))));
}

#[test]
fn garbage_after_terminator_dashes_is_malformed_data() {
    let input: &[u8] =
        b"--boundary\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nbody\r\n--boundary--corrupted-tail";

    let mut parser = Parser::new(Config::new("boundary").unwrap());
    let result = parser.parse(input);

    assert!(matches!(result, Err(Error::MalformedData(_))));
}

#[test]
fn terminator_tolerates_linear_whitespace_before_crlf() {
    let input: &[u8] =
        b"--boundary\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nbody\r\n--boundary--  \t \r\n";

    let mut parser = Parser::new(Config::new("boundary").unwrap());
    let events = parser.parse(input).unwrap();

    assert!(matches!(events.last(), Some(Event::Finished)));
}

#[test]
fn releasing_session_before_finished_is_unexpected_exit() {
    let boundary = "8banana133744910kmmr13a56!102!2405";
    let chunks: &[&[u8]] = &[
        b"--8banana133744910kmmr",
        b"13a56!102!2405\r\nContent-Disposition: form-da",
        b"ta; name=\"file_1\"; filename=\"test_file1.tx",
        b"t\"\r\nContent-Type: application/octet-strea",
    ];

    let mut session = Session::new(Config::new(boundary).unwrap());
    for chunk in chunks {
        session.feed(chunk);
        while !matches!(session.next_event().unwrap(), Event::NeedData) {}
    }

    assert!(matches!(session.finish(), Err(Error::UnexpectedExit)));
}

#[test]
fn body_containing_near_boundary_bytes() {
    let boundary = "8banana133744910kmmr13a56!102!1823";
    let body: &[u8] = b"\r\n--8banana133744910kmmr13a56!102!9999X";

    let mut input = Vec::new();
    input.extend_from_slice(b"--8banana133744910kmmr13a56!102!1823\r\n");
    input.extend_from_slice(b"Content-Disposition: form-data; name=\"x\"\r\n\r\n");
    input.extend_from_slice(body);
    input.extend_from_slice(b"\r\n--8banana133744910kmmr13a56!102!1823--\r\n");

    let mut parser = Parser::new(Config::new(boundary).unwrap());
    let events = parser.parse(&input).unwrap();

    assert_part(&events[0], "x", None, None);

    let collected: Vec<u8> = events[1..events.len() - 1]
        .iter()
        .flat_map(|e| match e {
            Event::PartData(d) => d.raw.clone(),
            other => panic!("expected PartData, got {:?}", other),
        })
        .collect();
    assert_eq!(collected, body);
    assert!(matches!(events.last(), Some(Event::Finished)));
}

#[test]
fn chunk_splitting_is_invariant_to_split_points() {
    let boundary = "boundary";
    let whole: &[u8] = b"--boundary\r\nContent-Disposition: form-data; name=\"foo\"\r\n\r\nfield data\r\n--boundary--\r\n";

    let baseline = {
        let mut parser = Parser::new(Config::new(boundary).unwrap());
        describe(parser.parse(whole).unwrap())
    };

    for split in 1..whole.len() {
        let mut parser = Parser::new(Config::new(boundary).unwrap());
        let mut events = parser.parse(&whole[..split]).unwrap();
        events.extend(parser.parse(&whole[split..]).unwrap());

        assert_eq!(describe(events), baseline, "split at offset {}", split);
    }
}

/// Reduce a event sequence to a comparable, allocation-free-ish description:
/// PartData fragments are concatenated per part so that differing
/// fragmentation across split points doesn't fail the comparison.
fn describe(events: Vec<Event>) -> Vec<(Option<String>, Vec<u8>)> {
    let mut out = Vec::new();
    for event in events {
        match event {
            Event::Part(part) => out.push((Some(part.name), Vec::new())),
            Event::PartData(data) => {
                out.last_mut().expect("PartData without preceding Part").1.extend(data.raw);
            }
            Event::Finished => out.push((None, Vec::new())),
            Event::NeedData => unreachable!("parse() never returns NeedData"),
        }
    }
    out
}
