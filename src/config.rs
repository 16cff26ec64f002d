// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use encoding_rs::{Encoding, UTF_8};

use crate::error::ConfigError;

/// The boundary token a boundary line may not exceed, per RFC 2046 §5.1.1.
const MAX_BOUNDARY_LEN: usize = 70;

/// Construction parameters for a [`Parser`](crate::Parser): the boundary
/// token taken from the enclosing `Content-Type` header, and the charset
/// used to decode header values.
///
/// Defaults to `utf-8` if [`with_charset`](Config::with_charset) is never
/// called.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) boundary: Vec<u8>,
    pub(crate) charset: &'static Encoding,
}

impl Config {
    /// Create a new `Config` for the given boundary token, validating its
    /// length up front rather than discovering a bad boundary mid-stream.
    pub fn new(boundary: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let boundary = boundary.into();

        if boundary.is_empty() {
            return Err(ConfigError::EmptyBoundary);
        }

        if boundary.len() > MAX_BOUNDARY_LEN {
            return Err(ConfigError::BoundaryTooLong(boundary.len()));
        }

        Ok(Config {
            boundary,
            charset: UTF_8,
        })
    }

    /// Override the charset used to decode header values. Accepts any label
    /// recognized by the [WHATWG Encoding Standard](https://encoding.spec.whatwg.org/).
    pub fn with_charset(mut self, charset: &str) -> Result<Self, ConfigError> {
        self.charset = Encoding::for_label(charset.as_bytes())
            .ok_or_else(|| ConfigError::UnknownCharset(charset.to_owned()))?;
        Ok(self)
    }
}
