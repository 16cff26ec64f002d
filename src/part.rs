// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use http::HeaderMap;
use mime::Mime;

/// The head of a single multipart section: its headers, its `Content-Disposition`
/// parameters, and (if the caller chooses to accumulate it) its body.
///
/// The parser never writes to [`body`](Part::body); it is populated only by
/// calling [`buffer`](Part::buffer) with the `PartData` fragments the parser
/// emits for this part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Every header on this part, in first-occurrence order, name comparisons
    /// case-insensitive per [`http::HeaderMap`].
    pub headers: HeaderMap,
    /// The mandatory `name` parameter of `Content-Disposition: form-data`.
    pub name: String,
    /// The optional `filename` parameter; present for file uploads.
    pub filename: Option<String>,
    /// The value of this part's `Content-Type` header, if present.
    pub content_type: Option<Mime>,
    body: Option<Vec<u8>>,
}

impl Part {
    pub(crate) fn new(
        headers: HeaderMap,
        name: String,
        filename: Option<String>,
        content_type: Option<Mime>,
    ) -> Self {
        Part {
            headers,
            name,
            filename,
            content_type,
            body: None,
        }
    }

    /// Append a body fragment emitted for this part into its accumulated
    /// body buffer, allocating it on first use.
    pub fn buffer(&mut self, data: &PartData) {
        self.body.get_or_insert_with(Vec::new).extend_from_slice(&data.raw);
    }

    /// The body accumulated so far via [`buffer`](Part::buffer), if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// A fragment of a single part's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartData {
    /// The raw bytes of this fragment.
    pub raw: Vec<u8>,
    /// `raw.len()`, kept alongside for convenience.
    pub size: usize,
}

impl PartData {
    pub(crate) fn new(raw: Vec<u8>) -> Self {
        let size = raw.len();
        PartData { raw, size }
    }
}
