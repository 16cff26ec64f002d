// Copyright 2017 `multipart-async` Crate Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
use encoding_rs::Encoding;
use http::{HeaderMap, HeaderName, HeaderValue};
use mime::Mime;

use crate::error::Error;

/// Headers allowed on a single part before we give up; browsers send a
/// handful (`Content-Disposition`, `Content-Type`, occasionally
/// `Content-Transfer-Encoding`), so this is generous headroom rather than a
/// tight bound.
const MAX_HEADERS: usize = 32;

pub(crate) struct ParsedHeaders {
    pub map: HeaderMap,
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<Mime>,
}

/// Parse a header block (including the terminating blank line) using
/// `httparse`, then pull `name`/`filename`/`content-type` out of it.
///
/// Returns `Ok(None)` if `raw` does not yet contain a complete header block.
pub(crate) fn parse(raw: &[u8], charset: &'static Encoding) -> Result<Option<(usize, ParsedHeaders)>, Error> {
    let consumed = match memchr::memmem::find(raw, b"\r\n\r\n") {
        Some(idx) => idx + 4,
        None => return Ok(None),
    };

    // httparse has no notion of RFC 7230 §3.2.4 obsolete line folding, so a
    // continuation line (one starting with SP/HTAB) reads to it as a
    // malformed header rather than part of the previous one. Unfold first.
    let unfolded = unfold(&raw[..consumed]);

    let mut storage = [httparse::EMPTY_HEADER; MAX_HEADERS];

    let raw_headers = match httparse::parse_headers(&unfolded, &mut storage) {
        Ok(httparse::Status::Complete((_, headers))) => headers,
        Ok(httparse::Status::Partial) => {
            return Err(Error::malformed("incomplete header block after unfolding"))
        }
        Err(e) => return Err(Error::malformed(format_args!("invalid header block: {}", e))),
    };

    let mut map = HeaderMap::with_capacity(raw_headers.len());
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;
    let mut seen_content_disposition = false;
    let mut seen_content_type = false;

    for header in raw_headers {
        let header_name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| Error::malformed(format_args!("invalid header name {:?}: {}", header.name, e)))?;

        let (decoded, _, had_errors) = charset.decode(header.value);
        if had_errors {
            return Err(Error::malformed(format_args!(
                "header {} value is not valid in the configured charset",
                header_name
            )));
        }
        let decoded = decoded.into_owned();

        if header_name.as_str() == "content-disposition" {
            if seen_content_disposition {
                return Err(Error::malformed("duplicate Content-Disposition header"));
            }
            seen_content_disposition = true;

            let (parsed_name, parsed_filename) = parse_content_disposition(&decoded)?;
            name = Some(parsed_name.ok_or_else(|| {
                Error::malformed("Content-Disposition: form-data is missing the required \"name\" parameter")
            })?);
            filename = parsed_filename;
        } else if header_name.as_str() == "content-type" {
            if seen_content_type {
                return Err(Error::malformed("duplicate Content-Type header"));
            }
            seen_content_type = true;

            content_type = Some(
                decoded
                    .parse::<Mime>()
                    .map_err(|e| Error::malformed(format_args!("invalid Content-Type: {}", e)))?,
            );
        }

        let header_value = HeaderValue::from_str(&decoded)
            .map_err(|e| Error::malformed(format_args!("invalid header value: {}", e)))?;
        map.append(header_name, header_value);
    }

    let name = name.ok_or_else(|| Error::malformed("part is missing the Content-Disposition header"))?;

    Ok(Some((
        consumed,
        ParsedHeaders {
            map,
            name,
            filename,
            content_type,
        },
    )))
}

/// Parse a `Content-Disposition` header value, returning `(name, filename)`.
///
/// Only the `form-data` disposition is accepted; RFC 2183 quoted-string
/// parameter values are unescaped (`\"` and `\\` only, no RFC 2047
/// encoded-words).
fn parse_content_disposition(value: &str) -> Result<(Option<String>, Option<String>), Error> {
    let mut params = split_params(value);

    let disposition = params.next().unwrap_or("").trim();
    if !disposition.eq_ignore_ascii_case("form-data") {
        return Err(Error::malformed(format_args!(
            "unsupported content-disposition: {:?}, expected \"form-data\"",
            disposition
        )));
    }

    let mut name = None;
    let mut filename = None;

    for param in params {
        let param = param.trim();
        let eq = match param.find('=') {
            Some(idx) => idx,
            None => continue,
        };

        let key = param[..eq].trim();
        let value = unquote(param[eq + 1..].trim());

        if key.eq_ignore_ascii_case("name") {
            name = Some(value);
        } else if key.eq_ignore_ascii_case("filename") {
            filename = Some(value);
        }
    }

    Ok((name, filename))
}

/// Replace each obs-fold (`CRLF 1*(SP / HTAB)`) with a single space, per RFC
/// 7230 §3.2.4. The trailing blank-line terminator is never itself folded
/// (its second `CRLF` is not followed by whitespace), so it passes through
/// unchanged.
fn unfold(block: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(block.len());
    let mut i = 0;
    while i < block.len() {
        if block[i] == b'\r'
            && block.get(i + 1) == Some(&b'\n')
            && matches!(block.get(i + 2), Some(b' ') | Some(b'\t'))
        {
            out.push(b' ');
            i += 2;
            while matches!(block.get(i), Some(b' ') | Some(b'\t')) {
                i += 1;
            }
        } else {
            out.push(block[i]);
            i += 1;
        }
    }
    out
}

/// Split a `;`-delimited parameter list, treating `;` inside a `"..."`
/// quoted value as part of the value rather than a separator.
fn split_params(value: &str) -> impl Iterator<Item = &str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let bytes = value.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'\\' if in_quotes => i += 1,
            b';' if !in_quotes => {
                out.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out.push(&value[start..]);

    out.into_iter()
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'"' || bytes[bytes.len() - 1] != b'"' {
        return value.to_owned();
    }

    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}
