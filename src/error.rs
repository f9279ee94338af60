use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SnapfixError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {source}")]
    StdinRead {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fix request JSON: {source}")]
    InvalidJsonRequest {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration '{path}': {message}")]
    InvalidConfig { path: String, message: String },

    #[error("Could not parse '{file}': {message}")]
    ParseFailure { file: String, message: String },

    #[error("Tree-sitter language initialization failed: {message}")]
    LanguageSetup { message: String },

    #[error(
        "Overlapping edits in '{file}': [{first_start}, {first_end}) conflicts with [{second_start}, {second_end})"
    )]
    ConflictingEdits {
        file: String,
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("Edit range [{start}, {end}) is not a valid UTF-8 boundary range in '{file}'")]
    InvalidEditRange {
        file: String,
        start: usize,
        end: usize,
    },

    #[error("Formatter '{command}' failed: {message}")]
    Formatter { command: String, message: String },

    #[error("File '{path}' is busy: another write is in progress")]
    ResourceBusy { path: String },

    #[error("File '{path}' changed on disk after its fixes were computed")]
    PathChanged { path: String },

    #[error("Write failed and restoring earlier files did not fully succeed: {message}")]
    RollbackFailed { message: String },
}

impl SnapfixError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn parse_failure(path: &Path, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            file: path.display().to_string(),
            message: message.into(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (r#type, suggestion) = match self {
            Self::Io { .. } | Self::StdinRead { .. } => ("io_error", None),
            Self::InvalidJsonRequest { .. } => (
                "invalid_request",
                Some("Pass a JSON array of fix requests or an object with a 'fixes' array"),
            ),
            Self::ResponseSerialization { .. } => ("serialization_error", None),
            Self::InvalidConfig { .. } => (
                "invalid_config",
                Some("Check snapfix.toml against the documented keys"),
            ),
            Self::ParseFailure { .. } | Self::LanguageSetup { .. } => (
                "parse_failure",
                Some("Could not apply any fixes due to a parse error"),
            ),
            Self::ConflictingEdits { .. } | Self::InvalidEditRange { .. } => {
                ("conflicting_edits", None)
            }
            Self::Formatter { .. } => ("formatter_failed", None),
            Self::ResourceBusy { .. } => (
                "resource_busy",
                Some("Retry after the current write completes"),
            ),
            Self::PathChanged { .. } => (
                "path_changed",
                Some("Re-run the test suite to collect fresh fixes"),
            ),
            Self::RollbackFailed { .. } => (
                "rollback_failed",
                Some("Check the listed files with version control before re-running"),
            ),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: r#type.to_string(),
                message: self.to_string(),
                suggestion: suggestion.map(str::to_string),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::SnapfixError;

    fn assert_error_type(
        error: SnapfixError,
        expected_type: &str,
        expected_suggestion_substring: Option<&str>,
    ) {
        let response = error.to_error_response();
        assert_eq!(response.error.r#type, expected_type);

        match (
            response.error.suggestion.as_deref(),
            expected_suggestion_substring,
        ) {
            (Some(actual), Some(expected_substring)) => {
                assert!(
                    actual.contains(expected_substring),
                    "suggestion should contain '{expected_substring}', got '{actual}'"
                );
            }
            (None, None) => {}
            (actual, expected) => {
                panic!("suggestion mismatch; actual={actual:?}, expected_contains={expected:?}")
            }
        }
    }

    #[test]
    fn parse_failure_and_language_setup_share_the_parse_failure_type() {
        assert_error_type(
            SnapfixError::ParseFailure {
                file: "broken.js".to_string(),
                message: "syntax error".to_string(),
            },
            "parse_failure",
            Some("parse error"),
        );
        assert_error_type(
            SnapfixError::LanguageSetup {
                message: "init error".to_string(),
            },
            "parse_failure",
            Some("parse error"),
        );
    }

    #[test]
    fn invalid_json_request_suggests_accepted_shapes() {
        let parse_error =
            serde_json::from_str::<serde_json::Value>("{").expect_err("invalid JSON should fail");
        assert_error_type(
            SnapfixError::InvalidJsonRequest {
                source: parse_error,
            },
            "invalid_request",
            Some("'fixes' array"),
        );
    }

    #[test]
    fn io_and_stdin_read_map_to_io_error_without_suggestion() {
        assert_error_type(
            SnapfixError::io(
                std::path::Path::new("missing.js"),
                std::io::Error::other("boom"),
            ),
            "io_error",
            None,
        );
        assert_error_type(
            SnapfixError::StdinRead {
                source: std::io::Error::other("closed"),
            },
            "io_error",
            None,
        );
    }

    #[test]
    fn conflicting_edits_message_names_both_ranges() {
        let error = SnapfixError::ConflictingEdits {
            file: "a.js".to_string(),
            first_start: 3,
            first_end: 9,
            second_start: 5,
            second_end: 7,
        };
        assert_eq!(
            error.to_string(),
            "Overlapping edits in 'a.js': [3, 9) conflicts with [5, 7)"
        );
        assert_error_type(error, "conflicting_edits", None);
    }

    #[test]
    fn write_guard_errors_keep_distinct_response_types() {
        assert_error_type(
            SnapfixError::ResourceBusy {
                path: "a.js".to_string(),
            },
            "resource_busy",
            Some("Retry after"),
        );
        assert_error_type(
            SnapfixError::PathChanged {
                path: "a.js".to_string(),
            },
            "path_changed",
            Some("Re-run the test suite"),
        );
        assert_error_type(
            SnapfixError::RollbackFailed {
                message: "a.js: permission denied".to_string(),
            },
            "rollback_failed",
            Some("version control"),
        );
    }

    #[test]
    fn io_message_names_the_path_without_assuming_a_read() {
        let error = SnapfixError::io(
            std::path::Path::new("dir/.a.js.tmp"),
            std::io::Error::other("rename failed"),
        );
        assert_eq!(error.to_string(), "I/O error on 'dir/.a.js.tmp': rename failed");
    }
}
