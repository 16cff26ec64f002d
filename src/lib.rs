// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//! A sans-I/O streaming parser for HTTP `multipart/form-data` request bodies
//! (RFC 7578).
//!
//! This crate owns no sockets, threads, or timers. The caller pushes bytes
//! into a [`Parser`] with [`Parser::feed`] and pulls [`Event`]s back out with
//! [`Parser::next_event`] or [`Parser::parse`]. This makes it usable from any
//! I/O model — blocking, non-blocking, or a fully async runtime — without the
//! parser itself depending on any of them.
//!
//! ```
//! use multipart_sans_io::{Config, Event, Parser};
//!
//! let config = Config::new("boundary").unwrap();
//! let mut parser = Parser::new(config);
//!
//! let events = parser
//!     .parse(b"--boundary\r\nContent-Disposition: form-data; name=\"foo\"\r\n\r\nfield data\r\n--boundary--\r\n")
//!     .unwrap();
//!
//! assert!(matches!(events.last(), Some(Event::Finished)));
//! ```
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod headers;
mod part;
mod ring_buffer;
mod state_machine;

pub use crate::config::Config;
pub use crate::error::{ConfigError, Error};
pub use crate::event::{Event, Parser, Session};
pub use crate::part::{Part, PartData};
