use tree_sitter::Node;

use crate::engine::SkipReason;
use crate::inspect::quote_string;
use crate::locate::{CallSite, string_literal_value};
use crate::request::FixStatus;
use crate::serialize::Serialized;

/// Byte-range replacement over a file's original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

impl Edit {
    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            new_text: new_text.into(),
        }
    }

    pub fn replace_node(node: Node<'_>, new_text: impl Into<String>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            new_text: new_text.into(),
        }
    }
}

/// Replaces the first occurrence of `old` in a full label phrase.
pub fn rewrite_label(full_label: &str, old: &str, new: &str) -> String {
    full_label.replacen(old, new, 1)
}

/// Edits that put `serialized` into the call site: one for a missing value,
/// one or two for a mismatch. The two ranges of a mismatch never overlap.
pub fn plan_edits(
    source: &str,
    site: &CallSite<'_>,
    status: FixStatus,
    reported_label: &str,
    serialized: &Serialized,
) -> Result<Vec<Edit>, SkipReason> {
    let label_argument = site
        .label_argument(status)
        .ok_or(SkipReason::MissingExpectedArgument)?;

    let new_label_literal = if serialized.label == reported_label {
        None
    } else {
        let current = string_literal_value(label_argument, source).ok_or(SkipReason::NonStringLabel)?;
        Some(quote_string(&rewrite_label(
            &current,
            reported_label,
            &serialized.label,
        )))
    };

    let edits = match (status, new_label_literal) {
        (FixStatus::Missing, None) => vec![Edit::insert(
            label_argument.end_byte(),
            format!(", {}", serialized.text),
        )],
        (FixStatus::Missing, Some(label)) => vec![Edit::replace_node(
            label_argument,
            format!("{label}, {}", serialized.text),
        )],
        (FixStatus::Mismatch, label) => {
            let expected = site
                .expected_argument()
                .ok_or(SkipReason::MissingExpectedArgument)?;
            let mut edits = Vec::with_capacity(2);
            if let Some(label) = label {
                edits.push(Edit::replace_node(label_argument, label));
            }
            edits.push(Edit::replace_node(expected, serialized.text.clone()));
            edits
        }
    };

    Ok(edits)
}
