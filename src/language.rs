use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tree_sitter::{Parser, Tree};

use crate::error::SnapfixError;

pub type LanguageLoader = fn() -> tree_sitter::Language;

/// A bundled grammar and the file extensions it handles.
#[derive(Debug, Clone, Copy)]
pub struct SourceLanguage {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    loader: LanguageLoader,
    syntax_error_message: &'static str,
}

const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "mts", "cts"];
const TSX_EXTENSIONS: &[&str] = &["tsx"];

const JAVASCRIPT: SourceLanguage = SourceLanguage {
    name: "tree-sitter-javascript",
    extensions: JAVASCRIPT_EXTENSIONS,
    loader: load_javascript_language,
    syntax_error_message: "Syntax errors detected in JavaScript source",
};

const TYPESCRIPT: SourceLanguage = SourceLanguage {
    name: "tree-sitter-typescript",
    extensions: TYPESCRIPT_EXTENSIONS,
    loader: load_typescript_language,
    syntax_error_message: "Syntax errors detected in TypeScript source",
};

const TSX: SourceLanguage = SourceLanguage {
    name: "tree-sitter-tsx",
    extensions: TSX_EXTENSIONS,
    loader: load_tsx_language,
    syntax_error_message: "Syntax errors detected in TSX source",
};

const BUNDLED_LANGUAGES: &[SourceLanguage] = &[JAVASCRIPT, TYPESCRIPT, TSX];

fn load_javascript_language() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn load_typescript_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn load_tsx_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

pub fn language_for_path(path: &Path) -> Option<&'static SourceLanguage> {
    let extension = path.extension()?.to_str()?;
    BUNDLED_LANGUAGES.iter().find(|language| {
        language
            .extensions
            .iter()
            .any(|supported| extension.eq_ignore_ascii_case(supported))
    })
}

pub fn supported_extensions() -> Vec<&'static str> {
    BUNDLED_LANGUAGES
        .iter()
        .flat_map(|language| language.extensions.iter().copied())
        .collect()
}

impl SourceLanguage {
    /// Parses `source`, treating any error or missing node as a parse failure.
    pub fn parse(&self, path: &Path, source: &str) -> Result<Tree, SnapfixError> {
        let parse_source = normalize_bare_cr_for_parser(source.as_bytes());
        debug_assert_eq!(parse_source.len(), source.len());

        let language = catch_unwind(AssertUnwindSafe(self.loader)).map_err(|_| {
            SnapfixError::LanguageSetup {
                message: format!("panic while loading bundled language '{}'", self.name),
            }
        })?;
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|error| SnapfixError::LanguageSetup {
                message: error.to_string(),
            })?;

        let tree = parser
            .parse(parse_source.as_ref(), None)
            .ok_or_else(|| SnapfixError::parse_failure(path, "Tree-sitter returned no syntax tree"))?;

        if tree.root_node().has_error() {
            return Err(SnapfixError::parse_failure(path, self.syntax_error_message));
        }

        Ok(tree)
    }
}

/// Turns lone `\r` into `\n` so tree-sitter rows match what editors show.
/// Byte length is preserved so spans stay valid against the original text.
fn normalize_bare_cr_for_parser(source: &[u8]) -> Cow<'_, [u8]> {
    let is_bare_cr = |index: usize, byte: u8| byte == b'\r' && source.get(index + 1) != Some(&b'\n');

    if !source
        .iter()
        .enumerate()
        .any(|(index, byte)| is_bare_cr(index, *byte))
    {
        return Cow::Borrowed(source);
    }

    Cow::Owned(
        source
            .iter()
            .enumerate()
            .map(|(index, byte)| if is_bare_cr(index, *byte) { b'\n' } else { *byte })
            .collect(),
    )
}
