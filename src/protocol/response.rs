//! Decoding of response frames.
//!
//! Every function takes the frame text without its terminating newline. A
//! single `\r` before the newline is ignored when matching, but kept in the
//! text of any error.
//!
//! Anything that is not the exact shape the request expects becomes
//! [`ClientError::Protocol`] carrying the frame verbatim, which is how the
//! server reports failures such as an unknown metric or a malformed vector.

use crate::error::{ClientError, Result};
use crate::types::VectorId;

const OK: &str = "OK";
const RESULT: &str = "RESULT";

/// Status of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    Ok,
    /// Payload after the `RESULT` prefix, leading whitespace removed.
    Result(&'a str),
}

/// Classify a frame by its status prefix.
pub fn classify(frame: &str) -> Result<Reply<'_>> {
    let body = frame.strip_suffix('\r').unwrap_or(frame);
    if body == OK {
        return Ok(Reply::Ok);
    }
    match body.strip_prefix(RESULT) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            Ok(Reply::Result(rest.trim_start()))
        }
        _ => Err(ClientError::protocol(frame)),
    }
}

/// Acknowledgement of CREATE, BULKLOAD, WRITE and OPTIMIZE.
pub fn expect_ok(frame: &str) -> Result<()> {
    match classify(frame)? {
        Reply::Ok => Ok(()),
        Reply::Result(_) => Err(ClientError::protocol(frame)),
    }
}

fn expect_result(frame: &str) -> Result<&str> {
    match classify(frame)? {
        Reply::Result(payload) => Ok(payload.trim_end()),
        Reply::Ok => Err(ClientError::protocol(frame)),
    }
}

/// `RESULT <kb>` reply to MEMORY.
pub fn decode_memory(frame: &str) -> Result<u64> {
    expect_result(frame)?
        .parse()
        .map_err(|_| ClientError::protocol(frame))
}

/// `RESULT [id, id, ...]` reply to a single-query SEARCH.
pub fn decode_ids(frame: &str) -> Result<Vec<VectorId>> {
    let payload = expect_result(frame)?;
    let mut groups = Groups::new(payload);
    let ids = match groups.next() {
        Some(group) => parse_group(group),
        None => None,
    };
    match (ids, groups.next(), groups.finished()) {
        (Some(ids), None, true) => Ok(ids),
        _ => Err(ClientError::protocol(frame)),
    }
}

/// `RESULT [ids] [ids] ...` reply to a multi-query SEARCH.
///
/// Groups are delimited by their brackets, so empty groups and groups with
/// no space between them (`[][1,2]`) are accepted. The number of groups
/// must match the number of queries sent.
pub fn decode_batch(frame: &str, expected: usize) -> Result<Vec<Vec<VectorId>>> {
    let payload = expect_result(frame)?;
    let mut groups = Groups::new(payload);
    let mut results = Vec::with_capacity(expected);
    for group in groups.by_ref() {
        match parse_group(group) {
            Some(ids) => results.push(ids),
            None => return Err(ClientError::protocol(frame)),
        }
    }
    if !groups.finished() || results.len() != expected {
        return Err(ClientError::protocol(frame));
    }
    Ok(results)
}

/// Parse the inside of one bracketed group. `None` on malformed input.
fn parse_group(group: &str) -> Option<Vec<VectorId>> {
    if group.trim().is_empty() {
        return Some(Vec::new());
    }
    group
        .split(',')
        .map(|id| id.trim().parse().ok())
        .collect()
}

/// Iterator over the contents of `[...]` groups separated by optional whitespace.
struct Groups<'a> {
    rest: &'a str,
    malformed: bool,
}

impl<'a> Groups<'a> {
    fn new(payload: &'a str) -> Self {
        Self {
            rest: payload,
            malformed: false,
        }
    }

    /// True once all input was consumed as well-formed groups.
    fn finished(&self) -> bool {
        !self.malformed && self.rest.trim().is_empty()
    }
}

impl<'a> Iterator for Groups<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.malformed {
            return None;
        }
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }
        let Some(inner) = rest.strip_prefix('[') else {
            self.malformed = true;
            return None;
        };
        let Some(end) = inner.find(']') else {
            self.malformed = true;
            return None;
        };
        let group = &inner[..end];
        if group.contains('[') {
            self.malformed = true;
            return None;
        }
        self.rest = &inner[end + 1..];
        Some(group)
    }
}
