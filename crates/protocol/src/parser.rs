//! Log record header parser
//!
//! Every log line shipped over the bus starts with a fixed header of three
//! bracketed fields followed by the log text:
//!
//! ```text
//! [1623456789][instance-42][taskmanager.log] 2021-06-12 INFO Job started
//!  └ created ┘ └ instance ┘ └ log file name ┘ └ body ──────────────────┘
//! ```
//!
//! # Grammar
//!
//! - Three tokens, anchored at the start of the record
//! - Each token is `[` + zero or more of `[A-Za-z0-9_.-]` + `]`
//! - Tokens may be separated by ASCII whitespace
//! - `[]` yields an empty field, not an error
//!
//! The body is everything after the header. A single whitespace separator
//! directly after the header is not part of the body.
//!
//! Parsing never panics and never fails a batch: input either produces a
//! [`ParsedLogRecord`] or [`MalformedRecord`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::MalformedRecord;

/// Header pattern: three anchored bracket tokens
const HEADER_PATTERN: &str =
    r"^(\[[A-Za-z0-9_.\-]*\])[ \t\r\n\x0C]*(\[[A-Za-z0-9_.\-]*\])[ \t\r\n\x0C]*(\[[A-Za-z0-9_.\-]*\])";

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(HEADER_PATTERN).expect("header pattern is a valid regex"));

/// A log record with its header decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLogRecord {
    /// Creation timestamp from the first header field (0 if not an integer)
    pub created: i64,
    /// Instance that produced the line
    pub instance_id: String,
    /// Log file the line belongs to
    pub log_file_name: String,
    /// Log text after the header
    pub body: String,
}

/// Parse a raw bus payload
///
/// Invalid UTF-8 is replaced rather than rejected, so only a missing header
/// makes a record malformed.
pub fn parse(raw: &[u8]) -> Result<ParsedLogRecord, MalformedRecord> {
    parse_str(&String::from_utf8_lossy(raw))
}

/// Parse a log line that is already text
pub fn parse_str(text: &str) -> Result<ParsedLogRecord, MalformedRecord> {
    let caps = HEADER.captures(text).ok_or(MalformedRecord)?;
    let header = caps.get(0).ok_or(MalformedRecord)?;

    let field = |i: usize| caps.get(i).map_or("", |m| bracket_contents(m.as_str()));

    let created_field = field(1);
    let created = match created_field.parse::<i64>() {
        Ok(ts) => ts,
        Err(e) => {
            tracing::debug!(field = created_field, error = %e, "created timestamp is not an integer, using 0");
            0
        }
    };

    Ok(ParsedLogRecord {
        created,
        instance_id: field(2).to_string(),
        log_file_name: field(3).to_string(),
        body: body_after(text, header.end()).to_string(),
    })
}

/// Strip the surrounding brackets from a matched token
#[inline]
fn bracket_contents(token: &str) -> &str {
    if token.len() <= 2 {
        return "";
    }
    // Tokens are ASCII-only by construction of the pattern
    &token[1..token.len() - 1]
}

/// Text after the header, minus one whitespace separator
#[inline]
fn body_after(text: &str, header_end: usize) -> &str {
    let rest = &text[header_end..];
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => chars.as_str(),
        _ => rest,
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
