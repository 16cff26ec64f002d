// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use encoding_rs::Encoding;
use log::{debug, trace};

use crate::error::Error;
use crate::headers;
use crate::part::{Part, PartData};
use crate::ring_buffer::RingBuffer;

/// One event surfaced by [`StateMachine::next_event`].
#[derive(Debug)]
pub enum Event {
    /// The headers of a new part.
    Part(Part),
    /// A fragment of the current part's body.
    PartData(PartData),
    /// No event can be produced without more input.
    NeedData,
    /// The terminator has been recognized; the stream is exhausted.
    Finished,
}

#[derive(Debug, PartialEq, Eq)]
enum Phase {
    Preamble,
    DelimiterTail,
    Headers,
    Body,
    Epilogue,
    Finished,
}

enum Step {
    Event(Event),
    NeedData,
    Continue,
}

/// The core automaton: recognizes the multipart envelope byte by byte,
/// buffering only as much as is needed to tell a real delimiter from one
/// that merely starts that way.
pub(crate) struct StateMachine {
    buf: RingBuffer,
    phase: Phase,
    first_delimiter: Vec<u8>,
    delimiter_line: Vec<u8>,
    charset: &'static Encoding,
    finished_returned: bool,
    poisoned: Option<String>,
}

impl StateMachine {
    pub(crate) fn new(boundary: &[u8], charset: &'static Encoding) -> Self {
        let mut first_delimiter = Vec::with_capacity(2 + boundary.len());
        first_delimiter.extend_from_slice(b"--");
        first_delimiter.extend_from_slice(boundary);

        let mut delimiter_line = Vec::with_capacity(4 + boundary.len());
        delimiter_line.extend_from_slice(b"\r\n--");
        delimiter_line.extend_from_slice(boundary);

        StateMachine {
            buf: RingBuffer::new(),
            phase: Phase::Preamble,
            first_delimiter,
            delimiter_line,
            charset,
            finished_returned: false,
            poisoned: None,
        }
    }

    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        self.buf.append(bytes);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub(crate) fn next_event(&mut self) -> Result<Event, Error> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::malformed(reason.clone()));
        }

        if self.finished_returned {
            let reason = "next_event() called again after the stream already finished";
            self.poisoned = Some(reason.to_owned());
            return Err(Error::malformed(reason));
        }

        loop {
            match self.step() {
                Ok(Step::Event(Event::Finished)) => {
                    self.finished_returned = true;
                    return Ok(Event::Finished);
                }
                Ok(Step::Event(event)) => return Ok(event),
                Ok(Step::NeedData) => return Ok(Event::NeedData),
                Ok(Step::Continue) => continue,
                Err(e) => {
                    self.poisoned = Some(e.to_string());
                    return Err(e);
                }
            }
        }
    }

    fn step(&mut self) -> Result<Step, Error> {
        match self.phase {
            Phase::Preamble => self.step_preamble(),
            Phase::DelimiterTail => self.step_delimiter_tail(),
            Phase::Headers => self.step_headers(),
            Phase::Body => self.step_body(),
            Phase::Epilogue => self.step_epilogue(),
            Phase::Finished => Ok(Step::Event(Event::Finished)),
        }
    }

    fn step_preamble(&mut self) -> Result<Step, Error> {
        trace!("preamble: {} bytes buffered", self.buf.len());

        if let Some(idx) = self.buf.find(&self.first_delimiter, 0) {
            self.buf.consume(idx + self.first_delimiter.len());
            self.phase = Phase::DelimiterTail;
            return Ok(Step::Continue);
        }

        let suspense = self.first_delimiter.len().saturating_sub(1);
        let len = self.buf.len();
        if len > suspense {
            self.buf.consume(len - suspense);
        }
        Ok(Step::NeedData)
    }

    fn step_delimiter_tail(&mut self) -> Result<Step, Error> {
        let view = self.buf.view();

        if view.len() < 2 {
            return Ok(Step::NeedData);
        }

        if &view[..2] == b"\r\n" {
            self.buf.consume(2);
            self.phase = Phase::Headers;
            trace!("delimiter tail: more parts follow");
            return Ok(Step::Continue);
        }

        if &view[..2] != b"--" {
            return Err(Error::malformed(
                "delimiter is followed by neither CRLF nor \"--\" CRLF",
            ));
        }

        // Terminator: "--" then optional linear whitespace then CRLF. Anything
        // else trailing the "--" is malformed, not epilogue.
        let mut i = 2;
        while i < view.len() && (view[i] == b' ' || view[i] == b'\t') {
            i += 1;
        }
        if i + 1 >= view.len() {
            return Ok(Step::NeedData);
        }
        if &view[i..i + 2] != b"\r\n" {
            return Err(Error::malformed(
                "delimiter is followed by neither CRLF nor \"--\" CRLF",
            ));
        }

        self.buf.consume(i + 2);
        self.phase = Phase::Epilogue;
        trace!("delimiter tail: terminator recognized");
        Ok(Step::Continue)
    }

    fn step_headers(&mut self) -> Result<Step, Error> {
        let view = self.buf.view();
        match headers::parse(view, self.charset)? {
            Some((consumed, parsed)) => {
                debug!("parsed headers for part {:?}", parsed.name);
                self.buf.consume(consumed);
                self.phase = Phase::Body;
                Ok(Step::Event(Event::Part(Part::new(
                    parsed.map,
                    parsed.name,
                    parsed.filename,
                    parsed.content_type,
                ))))
            }
            None => Ok(Step::NeedData),
        }
    }

    fn step_body(&mut self) -> Result<Step, Error> {
        if let Some(idx) = self.buf.find(&self.delimiter_line, 0) {
            let data = if idx > 0 {
                Some(self.buf.view()[..idx].to_vec())
            } else {
                None
            };

            self.buf.consume(idx + self.delimiter_line.len());
            self.phase = Phase::DelimiterTail;

            return Ok(match data {
                Some(data) => Step::Event(Event::PartData(PartData::new(data))),
                None => Step::Continue,
            });
        }

        let suspense = self.delimiter_line.len().saturating_sub(1);
        let len = self.buf.len();
        if len > suspense {
            let emit_len = len - suspense;
            let data = self.buf.view()[..emit_len].to_vec();
            self.buf.consume(emit_len);
            return Ok(Step::Event(Event::PartData(PartData::new(data))));
        }

        Ok(Step::NeedData)
    }

    fn step_epilogue(&mut self) -> Result<Step, Error> {
        let len = self.buf.len();
        if len > 0 {
            trace!("epilogue: discarding {} bytes", len);
            self.buf.consume(len);
        }
        self.phase = Phase::Finished;
        Ok(Step::Event(Event::Finished))
    }
}
