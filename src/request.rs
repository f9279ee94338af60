use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapfixError;
use crate::inspect::{Inspector, LiteralInspector};
use crate::subject::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    /// The assertion has no expected value yet.
    Missing,
    /// The expected value is present but disagrees with the subject.
    Mismatch,
}

/// One observed assertion outcome, as recorded by the collector.
///
/// `line` and `column` are 1-based; `column` counts UTF-16 code units the way
/// JavaScript stack traces do.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixRequest {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub status: FixStatus,
    pub label: String,
    pub subject: Subject,
    #[serde(skip, default = "default_inspector")]
    pub inspector: Arc<dyn Inspector>,
}

fn default_inspector() -> Arc<dyn Inspector> {
    Arc::new(LiteralInspector::default())
}

impl FixRequest {
    pub fn new(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        status: FixStatus,
        label: impl Into<String>,
        subject: Subject,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            status,
            label: label.into(),
            subject,
            inspector: default_inspector(),
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn Inspector>) -> Self {
        self.inspector = inspector;
        self
    }
}

/// Parses a batch of fix requests: either a bare JSON array or an object with
/// a `fixes` array.
pub fn parse_fix_batch(raw: &str) -> Result<Vec<FixRequest>, SnapfixError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|source| SnapfixError::InvalidJsonRequest { source })?;

    let fixes = match value {
        Value::Object(mut object) if object.contains_key("fixes") => object
            .remove("fixes")
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };

    serde_json::from_value(fixes).map_err(|source| SnapfixError::InvalidJsonRequest { source })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{FixStatus, parse_fix_batch};
    use crate::error::SnapfixError;
    use crate::subject::Subject;

    const ONE_FIX: &str = r#"{
        "file": "test/a.js",
        "line": 3,
        "column": 5,
        "status": "missing",
        "label": "to match snapshot",
        "subject": {"type": "string", "value": "foo"}
    }"#;

    #[test]
    fn parses_bare_arrays_and_wrapped_batches() {
        let bare = parse_fix_batch(&format!("[{ONE_FIX}]")).expect("bare array parses");
        let wrapped =
            parse_fix_batch(&format!("{{\"fixes\": [{ONE_FIX}, {ONE_FIX}]}}")).expect("wrapped");

        assert_eq!(bare.len(), 1);
        assert_eq!(wrapped.len(), 2);
        let fix = &bare[0];
        assert_eq!(fix.file, Path::new("test/a.js"));
        assert_eq!((fix.line, fix.column), (3, 5));
        assert_eq!(fix.status, FixStatus::Missing);
        assert_eq!(fix.label, "to match snapshot");
        assert_eq!(fix.subject, Subject::string("foo"));
    }

    #[test]
    fn deserialized_requests_get_the_literal_inspector() {
        let fixes = parse_fix_batch(&format!("[{ONE_FIX}]")).expect("parses");
        assert_eq!(
            fixes[0].inspector.inspect(&Subject::number(1.0), 2).as_deref(),
            Some("1")
        );
    }

    #[test]
    fn rejects_unknown_fields_and_statuses() {
        let unknown_field = ONE_FIX.replace("\"line\"", "\"lineNumber\"");
        assert!(matches!(
            parse_fix_batch(&format!("[{unknown_field}]")),
            Err(SnapfixError::InvalidJsonRequest { .. })
        ));

        let unknown_status = ONE_FIX.replace("\"missing\"", "\"passed\"");
        assert!(matches!(
            parse_fix_batch(&format!("[{unknown_status}]")),
            Err(SnapfixError::InvalidJsonRequest { .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_fix_batch("[{"),
            Err(SnapfixError::InvalidJsonRequest { .. })
        ));
    }
}
