use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::subject::{Entry, NumberValue, SpecialNumber, Subject};

const DEFAULT_PREFERRED_WIDTH: usize = 80;

/// Renders a subject as source text at a given indentation width.
///
/// Returns `None` when the subject cannot be rendered as a finite literal.
/// Implementations must be deterministic for a given subject and width.
pub trait Inspector: fmt::Debug + Send + Sync {
    fn inspect(&self, subject: &Subject, width: usize) -> Option<String>;
}

/// Pretty-prints subjects as JavaScript literals in the `{ a: 1, b: 'x' }` style,
/// breaking containers over several lines once they exceed the preferred width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralInspector {
    preferred_width: usize,
}

impl LiteralInspector {
    pub fn with_preferred_width(preferred_width: usize) -> Self {
        Self { preferred_width }
    }

    fn render(&self, subject: &Subject, width: usize, depth: usize) -> Option<String> {
        match subject {
            Subject::Undefined => Some("undefined".to_string()),
            Subject::Null => Some("null".to_string()),
            Subject::Boolean { value } => Some(value.to_string()),
            Subject::Number { value } => Some(format_number(*value)),
            Subject::Bigint { digits } => Some(format!("{digits}n")),
            Subject::String { value } => Some(quote_string(value)),
            Subject::Array { items } => {
                let rendered = items
                    .iter()
                    .map(|item| self.render(item, width, depth + 1))
                    .collect::<Option<Vec<_>>>()?;
                Some(self.layout("[", "]", rendered, width, depth))
            }
            Subject::Object { entries } => self.render_entries(entries, width, depth),
            Subject::Instance {
                class_name,
                entries,
            } => {
                let body = self.render_entries(entries, width, depth)?;
                Some(format!("{class_name}({body})"))
            }
            Subject::Function { name } => Some(match name.as_deref() {
                Some(name) if !name.is_empty() => format!("function {name}() {{}}"),
                _ => "function () {}".to_string(),
            }),
            Subject::Date { iso } => Some(format!("new Date({})", quote_string(iso))),
            Subject::Regexp { source, flags } => Some(format!("/{source}/{flags}")),
            Subject::Circular { .. } => None,
        }
    }

    fn render_entries(&self, entries: &[Entry], width: usize, depth: usize) -> Option<String> {
        let rendered = entries
            .iter()
            .map(|entry| {
                let value = self.render(&entry.value, width, depth + 1)?;
                Some(format!("{}: {value}", format_key(&entry.key)))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(self.layout("{", "}", rendered, width, depth))
    }

    fn layout(
        &self,
        open: &str,
        close: &str,
        items: Vec<String>,
        width: usize,
        depth: usize,
    ) -> String {
        if items.is_empty() {
            return format!("{open}{close}");
        }

        if items.iter().all(|item| !item.contains('\n')) {
            let compact = format!("{open} {} {close}", items.join(", "));
            if depth * width + compact.len() <= self.preferred_width {
                return compact;
            }
        }

        let item_pad = " ".repeat(width * (depth + 1));
        let close_pad = " ".repeat(width * depth);
        let body = items
            .iter()
            .map(|item| format!("{item_pad}{item}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{open}\n{body}\n{close_pad}{close}")
    }
}

impl Default for LiteralInspector {
    fn default() -> Self {
        Self::with_preferred_width(DEFAULT_PREFERRED_WIDTH)
    }
}

impl Inspector for LiteralInspector {
    fn inspect(&self, subject: &Subject, width: usize) -> Option<String> {
        self.render(subject, width, 0)
    }
}

fn format_number(value: NumberValue) -> String {
    match value {
        NumberValue::Special(SpecialNumber::NaN) => "NaN".to_string(),
        NumberValue::Special(SpecialNumber::Infinity) => "Infinity".to_string(),
        NumberValue::Special(SpecialNumber::NegativeInfinity) => "-Infinity".to_string(),
        NumberValue::Special(SpecialNumber::NegativeZero) => "-0".to_string(),
        NumberValue::Finite(number) if number.is_nan() => "NaN".to_string(),
        NumberValue::Finite(number) if number.is_infinite() && number > 0.0 => {
            "Infinity".to_string()
        }
        NumberValue::Finite(number) if number.is_infinite() => "-Infinity".to_string(),
        NumberValue::Finite(number) if number == 0.0 && number.is_sign_negative() => {
            "-0".to_string()
        }
        NumberValue::Finite(number) if number.fract() == 0.0 && number.abs() < 1e21 => {
            format!("{number:.0}")
        }
        NumberValue::Finite(number) if (1e-6..1e21).contains(&number.abs()) => number.to_string(),
        NumberValue::Finite(number) => exponent_form(number),
    }
}

/// Shortest round-trip digits with a signed exponent, as in `1e-7` or `1.5e+21`.
fn exponent_form(number: f64) -> String {
    let formatted = format!("{number:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

/// Quotes a string as a single-quoted JavaScript literal.
pub(crate) fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for character in value.chars() {
        match character {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{c}' => quoted.push_str("\\f"),
            '\u{b}' => quoted.push_str("\\v"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            control if (control as u32) < 0x20 => {
                quoted.push_str(&format!("\\x{:02x}", control as u32));
            }
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

fn format_key(key: &str) -> String {
    static BARE_KEY: OnceLock<Regex> = OnceLock::new();
    let bare_key = BARE_KEY.get_or_init(|| {
        Regex::new(r"^(?:[\p{L}_$][\p{L}\p{M}\p{N}_$]*|0|[1-9][0-9]*)$")
            .expect("object key regex should compile")
    });

    if bare_key.is_match(key) {
        key.to_string()
    } else {
        quote_string(key)
    }
}
