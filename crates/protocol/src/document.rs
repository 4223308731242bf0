//! Search index documents
//!
//! `IndexDocument` is the JSON body written to the search index for every
//! well-formed record. Field names match the index mapping created by the
//! index sink.
//!
//! Index names end up as a URL path segment, so they are checked with
//! [`check_index_name`] before any request is built.

use serde::{Deserialize, Serialize};

use crate::error::InvalidIndexName;
use crate::parser::ParsedLogRecord;

/// Characters the search backend rejects in index names
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Longest accepted index name in bytes
const MAX_INDEX_NAME_LEN: usize = 255;

/// Check that `name` is accepted by the search backend as an index name
///
/// Valid names are non-empty, lowercase, at most 255 bytes long, do not
/// start with `_`, `-` or `+`, are not `.` or `..`, and contain no path,
/// wildcard or separator characters.
pub fn check_index_name(name: &str) -> Result<(), InvalidIndexName> {
    let invalid = |reason| {
        Err(InvalidIndexName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.len() > MAX_INDEX_NAME_LEN {
        return invalid("must be at most 255 bytes");
    }
    if name == "." || name == ".." {
        return invalid("must not be '.' or '..'");
    }
    if name.starts_with(['_', '-', '+']) {
        return invalid("must not start with '_', '-' or '+'");
    }
    if name.chars().any(char::is_uppercase) {
        return invalid("must be lowercase");
    }
    if name
        .chars()
        .any(|c| c.is_control() || FORBIDDEN_INDEX_CHARS.contains(&c))
    {
        return invalid("must not contain spaces, control characters or any of \\ / * ? \" < > | , # :");
    }
    Ok(())
}

/// One log line as stored in the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Instance that produced the line (keyword)
    pub instance_id: String,
    /// Log file the line belongs to (keyword)
    pub log_file_name: String,
    /// Log text (full-text)
    pub log_entry: String,
    /// Creation timestamp (long)
    pub created: i64,
}

impl From<ParsedLogRecord> for IndexDocument {
    fn from(record: ParsedLogRecord) -> Self {
        Self {
            instance_id: record.instance_id,
            log_file_name: record.log_file_name,
            log_entry: record.body,
            created: record.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_document_from_parsed_record() {
        let doc = IndexDocument::from(parse(b"[7][inst][a.log] line").unwrap());

        assert_eq!(doc.instance_id, "inst");
        assert_eq!(doc.log_file_name, "a.log");
        assert_eq!(doc.log_entry, "line");
        assert_eq!(doc.created, 7);
    }

    #[test]
    fn test_document_json_field_names() {
        let doc = IndexDocument {
            instance_id: "i".into(),
            log_file_name: "f".into(),
            log_entry: "e".into(),
            created: 1,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["instance_id"], "i");
        assert_eq!(json["log_file_name"], "f");
        assert_eq!(json["log_entry"], "e");
        assert_eq!(json["created"], 1);
    }

    #[test]
    fn test_index_name_accepts_backend_names() {
        for name in ["logship-logs", "flow.logs-2024", "a", ".hidden", "logs_v2"] {
            assert!(check_index_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_index_name_rejects_path_and_wildcard_chars() {
        for name in [
            "logs/../_all",
            "logs\\x",
            "logs*",
            "lo?gs",
            "a\"b",
            "a<b",
            "a>b",
            "a|b",
            "a b",
            "a,b",
            "logs#frag",
            "a:b",
            "tab\there",
        ] {
            assert!(check_index_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_index_name_rejects_reserved_forms() {
        assert_eq!(check_index_name("").unwrap_err().reason, "must not be empty");
        assert_eq!(check_index_name("Logs").unwrap_err().reason, "must be lowercase");
        for name in ["_all", "-logs", "+logs", ".", ".."] {
            assert!(check_index_name(name).is_err(), "{name}");
        }
        assert!(check_index_name(&"a".repeat(256)).is_err());
        assert!(check_index_name(&"a".repeat(255)).is_ok());
    }
}
