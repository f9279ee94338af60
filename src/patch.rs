use std::path::Path;

use crate::error::SnapfixError;
use crate::plan::Edit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub changed: bool,
    pub text: String,
}

/// Applies every edit for one file in a single pass over its original text.
///
/// Edits are ordered by position (ties keep their queue order) and replaced
/// back to front so earlier offsets stay valid.
pub fn apply_edits(
    file: &Path,
    source_text: &str,
    mut edits: Vec<Edit>,
) -> Result<PatchOutcome, SnapfixError> {
    edits.sort_by_key(|edit| (edit.start, edit.end));
    ensure_non_overlapping(file, &edits)?;

    let mut text = source_text.to_string();
    for edit in edits.iter().rev() {
        if text.get(edit.start..edit.end).is_none() {
            return Err(SnapfixError::InvalidEditRange {
                file: file.display().to_string(),
                start: edit.start,
                end: edit.end,
            });
        }
        text.replace_range(edit.start..edit.end, &edit.new_text);
    }

    Ok(PatchOutcome {
        changed: text != source_text,
        text,
    })
}

pub(crate) fn ensure_non_overlapping(file: &Path, edits: &[Edit]) -> Result<(), SnapfixError> {
    for window in edits.windows(2) {
        let first = &window[0];
        let second = &window[1];
        let first_insert = first.start == first.end;
        let second_insert = second.start == second.end;

        if first.end > second.start
            || (first.end == second.start && (first_insert || second_insert))
        {
            return Err(SnapfixError::ConflictingEdits {
                file: file.display().to_string(),
                first_start: first.start,
                first_end: first.end,
                second_start: second.start,
                second_end: second.end,
            });
        }
    }

    Ok(())
}
