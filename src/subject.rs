use serde::{Deserialize, Serialize};

/// Observed runtime value of an assertion subject, as reported by the collector.
///
/// Cyclic structures cannot be expressed directly; the collector marks a
/// back-reference with [`Subject::Circular`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Subject {
    Undefined,
    Null,
    Boolean {
        value: bool,
    },
    Number {
        value: NumberValue,
    },
    Bigint {
        digits: String,
    },
    String {
        value: String,
    },
    Array {
        items: Vec<Subject>,
    },
    Object {
        entries: Vec<Entry>,
    },
    Instance {
        class_name: String,
        #[serde(default)]
        entries: Vec<Entry>,
    },
    Function {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Date {
        iso: String,
    },
    Regexp {
        source: String,
        #[serde(default)]
        flags: String,
    },
    Circular {
        #[serde(default)]
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: Subject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberValue {
    Finite(f64),
    Special(SpecialNumber),
}

/// Numbers JSON cannot carry as plain numerals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialNumber {
    #[serde(rename = "NaN")]
    NaN,
    #[serde(rename = "Infinity")]
    Infinity,
    #[serde(rename = "-Infinity")]
    NegativeInfinity,
    #[serde(rename = "-0")]
    NegativeZero,
}

impl Subject {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    pub fn number(value: f64) -> Self {
        Self::Number {
            value: NumberValue::Finite(value),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean { value }
    }

    pub fn array(items: impl IntoIterator<Item = Subject>) -> Self {
        Self::Array {
            items: items.into_iter().collect(),
        }
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Subject)>) -> Self {
        Self::Object {
            entries: collect_entries(entries),
        }
    }

    pub fn instance<K: Into<String>>(
        class_name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, Subject)>,
    ) -> Self {
        Self::Instance {
            class_name: class_name.into(),
            entries: collect_entries(entries),
        }
    }

    pub fn circular(path: impl Into<String>) -> Self {
        Self::Circular { path: path.into() }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            _ => None,
        }
    }

    /// True when the value is built only from plain objects, arrays and
    /// primitives, with no back-references and no opaque types.
    pub fn is_simple_object_tree(&self) -> bool {
        match self {
            Self::Undefined
            | Self::Null
            | Self::Boolean { .. }
            | Self::Number { .. }
            | Self::Bigint { .. }
            | Self::String { .. } => true,
            Self::Array { items } => items.iter().all(Subject::is_simple_object_tree),
            Self::Object { entries } => entries
                .iter()
                .all(|entry| entry.value.is_simple_object_tree()),
            Self::Instance { .. }
            | Self::Function { .. }
            | Self::Date { .. }
            | Self::Regexp { .. }
            | Self::Circular { .. } => false,
        }
    }
}

fn collect_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, Subject)>) -> Vec<Entry> {
    entries
        .into_iter()
        .map(|(key, value)| Entry {
            key: key.into(),
            value,
        })
        .collect()
}
