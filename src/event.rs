// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use log::warn;

use crate::config::Config;
use crate::error::Error;
use crate::state_machine::StateMachine;

pub use crate::state_machine::Event;

/// The external façade over the [`StateMachine`](crate::state_machine::StateMachine):
/// a sans-I/O `multipart/form-data` parser.
///
/// The caller pushes bytes in with [`feed`](Parser::feed) and pulls events
/// back out with [`next_event`](Parser::next_event) (one at a time) or
/// [`parse`](Parser::parse) (drain everything decidable right now).
pub struct Parser {
    machine: StateMachine,
}

impl Parser {
    /// Construct a parser for a message using the given boundary and charset.
    pub fn new(config: Config) -> Self {
        Parser {
            machine: StateMachine::new(&config.boundary, config.charset),
        }
    }

    /// Append a chunk of input. Never blocks, never fails.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.machine.feed(bytes);
    }

    /// Advance the automaton and return exactly one event.
    ///
    /// Returns [`Event::NeedData`] when the currently buffered bytes are not
    /// enough to decide anything further.
    pub fn next_event(&mut self) -> Result<Event, Error> {
        self.machine.next_event()
    }

    /// Feed `bytes` and drain every event decidable from the input fed so
    /// far, stopping at [`Event::NeedData`] or [`Event::Finished`].
    pub fn parse(&mut self, bytes: &[u8]) -> Result<Vec<Event>, Error> {
        self.feed(bytes);

        let mut events = Vec::new();
        loop {
            match self.next_event()? {
                Event::NeedData => break,
                Event::Finished => {
                    events.push(Event::Finished);
                    break;
                }
                event => events.push(event),
            }
        }
        Ok(events)
    }

    /// Whether the automaton has reached its terminal `FINISHED` state.
    pub fn is_finished(&self) -> bool {
        self.machine.is_finished()
    }
}

/// A scoped acquisition of a [`Parser`] that guarantees the caller notices if
/// it is released before the message was fully parsed.
///
/// Prefer calling [`finish`](Session::finish) explicitly; it is the only way
/// to observe [`Error::UnexpectedExit`]. Dropping the session without calling
/// it logs a warning as a backstop, since `Drop` cannot return a `Result`.
pub struct Session {
    parser: Option<Parser>,
}

impl Session {
    /// Begin a new scoped session around a fresh [`Parser`].
    pub fn new(config: Config) -> Self {
        Session {
            parser: Some(Parser::new(config)),
        }
    }

    /// Release the session, raising [`Error::UnexpectedExit`] if the
    /// underlying parser had not reached `FINISHED`.
    pub fn finish(mut self) -> Result<(), Error> {
        let parser = self.parser.take().expect("Session parser taken twice");
        if parser.is_finished() {
            Ok(())
        } else {
            Err(Error::UnexpectedExit)
        }
    }
}

impl std::ops::Deref for Session {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser.as_ref().expect("Session used after finish()")
    }
}

impl std::ops::DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser.as_mut().expect("Session used after finish()")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            if !parser.is_finished() {
                warn!("multipart session dropped without calling finish() before the stream completed");
            }
        }
    }
}
