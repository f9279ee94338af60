use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::document::{DocumentCache, FsLoader, SourceDocument, SourceLoader};
use crate::error::SnapfixError;
use crate::format::{Formatter, format_or_keep};
use crate::indent::line_indentation;
use crate::locate::find_call_site;
use crate::patch::apply_edits;
use crate::plan::{Edit, plan_edits};
use crate::policy::Policy;
use crate::request::FixRequest;
use crate::serialize::{SerializeContext, serialize};

/// Why a fix request produced no edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnresolvedCallSite,
    UnserializableValue,
    UnsupportedLabel,
    NonStringLabel,
    DuplicateCallSite,
    MissingExpectedArgument,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Self::UnresolvedCallSite => "no assertion call starts at this position",
            Self::UnserializableValue => "the observed value cannot be rendered",
            Self::UnsupportedLabel => "the label has no inspect variant for this value",
            Self::NonStringLabel => "the label argument is not a string literal",
            Self::DuplicateCallSite => "the call site was already fixed in this batch",
            Self::MissingExpectedArgument => "the call has no expected-value argument",
        };
        formatter.write_str(description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFix {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixResult {
    pub total_fixed: usize,
    pub updated_text_by_file: BTreeMap<PathBuf, String>,
    /// Hash of the text each updated file was fixed from.
    pub source_hash_by_file: BTreeMap<PathBuf, String>,
    pub skipped: Vec<SkippedFix>,
}

/// Applies batches of fix requests; each call gets a fresh document cache.
pub struct Engine {
    policy: Policy,
    loader: Box<dyn SourceLoader>,
    formatter: Option<Box<dyn Formatter>>,
}

impl Engine {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            loader: Box::new(FsLoader),
            formatter: None,
        }
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Fixes every request it can and returns the new text of changed files.
    ///
    /// A file that fails to load or parse aborts the whole batch, so callers
    /// never see a partial result.
    pub fn apply_fixes(&self, requests: &[FixRequest]) -> Result<FixResult, SnapfixError> {
        let mut cache = DocumentCache::new(self.loader.as_ref(), self.policy.default_indent);
        let mut edits_by_file: BTreeMap<PathBuf, Vec<Edit>> = BTreeMap::new();
        let mut visited: HashSet<(PathBuf, usize)> = HashSet::new();
        let mut result = FixResult::default();

        for request in requests {
            let document = cache.get(&request.file)?;
            match self.plan_request(document, request, &mut visited) {
                Ok(edits) => {
                    debug!(
                        file = %request.file.display(),
                        line = request.line,
                        column = request.column,
                        edits = edits.len(),
                        "planned assertion fix"
                    );
                    result.total_fixed += 1;
                    edits_by_file
                        .entry(request.file.clone())
                        .or_default()
                        .extend(edits);
                }
                Err(reason) => {
                    debug!(
                        file = %request.file.display(),
                        line = request.line,
                        column = request.column,
                        %reason,
                        "skipped fix request"
                    );
                    result.skipped.push(SkippedFix {
                        file: request.file.clone(),
                        line: request.line,
                        column: request.column,
                        reason,
                    });
                }
            }
        }

        for (file, edits) in edits_by_file {
            let document = cache.get(&file)?;
            let edit_count = edits.len();
            let outcome = apply_edits(&file, &document.text, edits)?;
            if !outcome.changed {
                continue;
            }

            let text = format_or_keep(self.formatter.as_deref(), outcome.text, &file);
            info!(file = %file.display(), edits = edit_count, "patched test file");
            result
                .source_hash_by_file
                .insert(file.clone(), document.source_hash.clone());
            result.updated_text_by_file.insert(file, text);
        }

        Ok(result)
    }

    fn plan_request(
        &self,
        document: &SourceDocument,
        request: &FixRequest,
        visited: &mut HashSet<(PathBuf, usize)>,
    ) -> Result<Vec<Edit>, SkipReason> {
        let site = find_call_site(
            document,
            &self.policy.entry_point,
            request.line,
            request.column,
        )
        .ok_or(SkipReason::UnresolvedCallSite)?;

        let key = (document.path.clone(), site.start_byte());
        if visited.contains(&key) {
            return Err(SkipReason::DuplicateCallSite);
        }

        let anchor_indent = line_indentation(&document.text, site.anchor().start_byte());
        let context = SerializeContext {
            unit: document.indentation,
            anchor_indent: &anchor_indent,
            inspector: request.inspector.as_ref(),
        };
        let serialized = serialize(
            &request.subject,
            &request.label,
            self.policy.rule_for(&request.label),
            &context,
        )?;
        let edits = plan_edits(
            &document.text,
            &site,
            request.status,
            &request.label,
            &serialized,
        )?;

        visited.insert(key);
        Ok(edits)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

/// Applies `requests` with the default policy, reading files from disk.
pub fn apply_fixes(requests: &[FixRequest]) -> Result<FixResult, SnapfixError> {
    Engine::default().apply_fixes(requests)
}
