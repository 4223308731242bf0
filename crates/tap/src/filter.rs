//! Record filter for live-follow streams
//!
//! `FilterCriteria` is built once per follow request and never changes for
//! the lifetime of the stream.
//!
//! # Filter Logic
//!
//! - `instance_id` is required and matched exactly
//! - `log_file_name` is optional (None = any file), matched exactly
//! - Both checks are AND'd
//!
//! # Example
//!
//! ```
//! use logship_tap::FilterCriteria;
//!
//! // Only lines of taskmanager.log written by instance-42
//! let criteria = FilterCriteria::new("instance-42").with_log_file("taskmanager.log");
//! ```

use logship_protocol::{FollowRequest, ParsedLogRecord};

/// Instance and file filter applied to parsed records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Instance to match
    instance_id: String,
    /// Log file to match (None = match all)
    log_file_name: Option<String>,
}

impl FilterCriteria {
    /// Match every file of one instance
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            log_file_name: None,
        }
    }

    /// Create criteria from a follow request
    pub fn from_request(req: &FollowRequest) -> Self {
        let criteria = Self::new(req.instance_id.clone());
        match req.log_file_name.as_deref() {
            Some(name) => criteria.with_log_file(name),
            None => criteria,
        }
    }

    /// Restrict to one log file
    ///
    /// An empty name keeps the filter open to all files.
    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.log_file_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Check if a parsed record passes the filter
    #[inline]
    pub fn matches(&self, record: &ParsedLogRecord) -> bool {
        if record.instance_id != self.instance_id {
            return false;
        }

        if let Some(ref name) = self.log_file_name
            && record.log_file_name != *name
        {
            return false;
        }

        true
    }

    /// Instance this filter follows
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Log file filter (for debugging/logging)
    pub fn log_file_name(&self) -> Option<&str> {
        self.log_file_name.as_deref()
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
