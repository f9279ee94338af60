use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::Tree;

use crate::error::SnapfixError;
use crate::hash::hash_text;
use crate::indent::IndentationUnit;
use crate::language::{SourceLanguage, language_for_path, supported_extensions};

/// Supplies the current text of a test file.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> Result<String, SnapfixError>;
}

/// Reads UTF-8 files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, SnapfixError> {
        let bytes = std::fs::read(path).map_err(|error| SnapfixError::io(path, error))?;
        String::from_utf8(bytes).map_err(|error| {
            SnapfixError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, error),
            )
        })
    }
}

/// Serves file contents from memory; used when the caller already holds the text.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, SnapfixError> {
        self.files.get(path).cloned().ok_or_else(|| {
            SnapfixError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no in-memory source"),
            )
        })
    }
}

/// A parsed test file, shared read-only by everything fixing it.
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
    pub language: &'static SourceLanguage,
    pub indentation: IndentationUnit,
    pub source_hash: String,
}

/// Parses each file at most once for the lifetime of one batch.
pub struct DocumentCache<'a> {
    loader: &'a dyn SourceLoader,
    default_indent: usize,
    documents: HashMap<PathBuf, SourceDocument>,
}

impl<'a> DocumentCache<'a> {
    pub fn new(loader: &'a dyn SourceLoader, default_indent: usize) -> Self {
        Self {
            loader,
            default_indent,
            documents: HashMap::new(),
        }
    }

    pub fn get(&mut self, path: &Path) -> Result<&SourceDocument, SnapfixError> {
        let loader = self.loader;
        let default_indent = self.default_indent;

        match self.documents.entry(path.to_path_buf()) {
            Entry::Occupied(occupied) => Ok(occupied.into_mut()),
            Entry::Vacant(vacant) => {
                let document = load_document(loader, path, default_indent)?;
                Ok(vacant.insert(document))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn load_document(
    loader: &dyn SourceLoader,
    path: &Path,
    default_indent: usize,
) -> Result<SourceDocument, SnapfixError> {
    let language = language_for_path(path).ok_or_else(|| {
        SnapfixError::parse_failure(
            path,
            format!(
                "no grammar for this file; supported extensions: {}",
                supported_extensions()
                    .iter()
                    .map(|extension| format!(".{extension}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
    })?;
    let text = loader.load(path)?;
    let tree = language.parse(path, &text)?;
    let indentation = IndentationUnit::for_text(&text, default_indent);
    debug!(
        file = %path.display(),
        grammar = language.name,
        indent_width = indentation.width,
        "parsed test file"
    );

    Ok(SourceDocument {
        path: path.to_path_buf(),
        source_hash: hash_text(&text),
        text,
        tree,
        language,
        indentation,
    })
}
