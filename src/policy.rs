use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SnapfixError;
use crate::indent::DEFAULT_INDENT_WIDTH;

pub const CONFIG_FILE_NAME: &str = "snapfix.toml";
const DEFAULT_ENTRY_POINT: &str = "expect";

/// Assertion vocabulary and formatting knobs, usually read from `snapfix.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default = "default_indent")]
    pub default_indent: usize,
    #[serde(default)]
    pub formatter: Option<FormatterConfig>,
    #[serde(default = "default_assertions", rename = "assertion")]
    pub assertions: Vec<AssertionRule>,
}

/// An equality-style label the engine knows how to fill in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertionRule {
    pub label: String,
    /// Label used when the subject has to be compared by its inspected form.
    pub inspect_label: String,
    #[serde(default)]
    pub block: BlockStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_tag: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStyle {
    /// Block literal only for strings that contain a newline.
    #[default]
    Multiline,
    /// Every string becomes a block literal (snapshot assertions unindent it).
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_string()
}

fn default_indent() -> usize {
    DEFAULT_INDENT_WIDTH
}

fn default_assertions() -> Vec<AssertionRule> {
    let snapshot = |label: &str| AssertionRule {
        label: label.to_string(),
        inspect_label: "to inspect as snapshot".to_string(),
        block: BlockStyle::Always,
        block_tag: None,
    };

    vec![
        AssertionRule {
            label: "to equal".to_string(),
            inspect_label: "to inspect as".to_string(),
            block: BlockStyle::Multiline,
            block_tag: Some("expect.unindent".to_string()),
        },
        snapshot("to equal snapshot"),
        snapshot("to match snapshot"),
    ]
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
            default_indent: default_indent(),
            formatter: None,
            assertions: default_assertions(),
        }
    }
}

impl Policy {
    pub fn rule_for(&self, label: &str) -> Option<&AssertionRule> {
        self.assertions.iter().find(|rule| rule.label == label)
    }

    pub fn from_toml_str(path: &Path, raw: &str) -> Result<Self, SnapfixError> {
        let policy: Self = toml::from_str(raw).map_err(|error| SnapfixError::InvalidConfig {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        policy.validate(path)?;
        Ok(policy)
    }

    pub fn load(path: &Path) -> Result<Self, SnapfixError> {
        let raw = std::fs::read_to_string(path).map_err(|error| SnapfixError::io(path, error))?;
        Self::from_toml_str(path, &raw)
    }

    /// Loads `snapfix.toml` from `directory` when present, else the defaults.
    pub fn discover(directory: &Path) -> Result<Self, SnapfixError> {
        let candidate: PathBuf = directory.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self, path: &Path) -> Result<(), SnapfixError> {
        let invalid = |message: String| SnapfixError::InvalidConfig {
            path: path.display().to_string(),
            message,
        };

        if self.entry_point.trim().is_empty() {
            return Err(invalid("entry_point must not be empty".to_string()));
        }
        if self.default_indent == 0 {
            return Err(invalid("default_indent must be at least 1".to_string()));
        }
        for rule in &self.assertions {
            if rule.label.is_empty() || rule.inspect_label.is_empty() {
                return Err(invalid(
                    "assertion label and inspect_label must not be empty".to_string(),
                ));
            }
        }
        if let Some(formatter) = &self.formatter
            && formatter.command.trim().is_empty()
        {
            return Err(invalid("formatter.command must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{BlockStyle, Policy};
    use crate::error::SnapfixError;

    #[test]
    fn defaults_cover_equality_and_snapshot_labels() {
        let policy = Policy::default();

        assert_eq!(policy.entry_point, "expect");
        assert_eq!(policy.default_indent, 4);
        let equal = policy.rule_for("to equal").expect("to equal rule");
        assert_eq!(equal.inspect_label, "to inspect as");
        assert_eq!(equal.block, BlockStyle::Multiline);
        assert_eq!(equal.block_tag.as_deref(), Some("expect.unindent"));
        let snapshot = policy.rule_for("to match snapshot").expect("snapshot rule");
        assert_eq!(snapshot.block, BlockStyle::Always);
        assert!(policy.rule_for("to satisfy").is_none());
    }

    #[test]
    fn toml_overrides_replace_the_assertion_table() {
        let policy = Policy::from_toml_str(
            Path::new("snapfix.toml"),
            r#"
entry_point = "assert"
default_indent = 2

[formatter]
command = "prettier"
args = ["--stdin-filepath", "{file}"]

[[assertion]]
label = "to be"
inspect_label = "to inspect as"
block = "always"
"#,
        )
        .expect("config should parse");

        assert_eq!(policy.entry_point, "assert");
        assert_eq!(policy.default_indent, 2);
        assert_eq!(policy.assertions.len(), 1);
        assert_eq!(policy.assertions[0].block, BlockStyle::Always);
        assert_eq!(policy.assertions[0].block_tag, None);
        assert_eq!(
            policy.formatter.as_ref().map(|formatter| formatter.command.as_str()),
            Some("prettier")
        );
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let policy =
            Policy::from_toml_str(Path::new("snapfix.toml"), "").expect("empty config parses");
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn unknown_keys_and_invalid_values_are_rejected() {
        let unknown = Policy::from_toml_str(Path::new("snapfix.toml"), "entrypoint = \"x\"\n");
        assert!(matches!(unknown, Err(SnapfixError::InvalidConfig { .. })));

        let zero_indent = Policy::from_toml_str(Path::new("snapfix.toml"), "default_indent = 0\n");
        assert!(matches!(
            zero_indent,
            Err(SnapfixError::InvalidConfig { message, .. }) if message.contains("default_indent")
        ));
    }

    #[test]
    fn discover_falls_back_to_defaults_without_a_config_file() {
        let directory = tempfile::tempdir().expect("temp dir");
        let policy = Policy::discover(directory.path()).expect("discover should succeed");
        assert_eq!(policy, Policy::default());

        std::fs::write(
            directory.path().join("snapfix.toml"),
            "entry_point = \"check\"\n",
        )
        .expect("config write");
        let policy = Policy::discover(directory.path()).expect("discover should read config");
        assert_eq!(policy.entry_point, "check");
    }
}
