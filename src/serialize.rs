//! Chooses the source text for an observed value.
//!
//! Serialization runs in two stages: [`render`] turns a subject into display
//! text through the inspector, and [`wrap_string`] turns a string into either
//! an inline literal or a block literal. Subjects that cannot be compared
//! structurally go through both stages, and the assertion label switches to
//! its inspect-flavored variant.

use crate::engine::SkipReason;
use crate::indent::IndentationUnit;
use crate::inspect::Inspector;
use crate::policy::{AssertionRule, BlockStyle};
use crate::subject::Subject;

/// Replacement text for the expected value and the label it should sit under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serialized {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SerializeContext<'a> {
    /// The file's indentation unit; its width is also the inspector width.
    pub unit: IndentationUnit,
    /// Indentation of the line holding the call site's anchor argument.
    pub anchor_indent: &'a str,
    pub inspector: &'a dyn Inspector,
}

pub fn serialize(
    subject: &Subject,
    label: &str,
    rule: Option<&AssertionRule>,
    context: &SerializeContext<'_>,
) -> Result<Serialized, SkipReason> {
    let (text, label) = match (subject, rule) {
        (Subject::String { value }, Some(rule)) => {
            (wrap_string(value, rule, context)?, label.to_string())
        }
        (subject, _) if subject.is_simple_object_tree() => {
            (render(subject, context)?, label.to_string())
        }
        (subject, Some(rule)) => {
            let display = render(subject, context)?;
            (
                wrap_string(&display, rule, context)?,
                rule.inspect_label.clone(),
            )
        }
        (_, None) => return Err(SkipReason::UnsupportedLabel),
    };

    Ok(Serialized {
        text: reindent(&text, context.anchor_indent),
        label,
    })
}

pub fn render(subject: &Subject, context: &SerializeContext<'_>) -> Result<String, SkipReason> {
    context
        .inspector
        .inspect(subject, context.unit.width)
        .ok_or(SkipReason::UnserializableValue)
}

pub fn wrap_string(
    value: &str,
    rule: &AssertionRule,
    context: &SerializeContext<'_>,
) -> Result<String, SkipReason> {
    if rule.block == BlockStyle::Always || value.contains('\n') {
        Ok(block_literal(value, rule.block_tag.as_deref(), &context.unit))
    } else {
        render(&Subject::string(value), context)
    }
}

/// A template literal holding `value` one unit deeper than its delimiters.
pub fn block_literal(value: &str, tag: Option<&str>, unit: &IndentationUnit) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${");
    let body = prefix_non_empty_lines(&escaped, &unit.to_string());
    format!("{}`\n{body}\n`", tag.unwrap_or_default())
}

/// Prefixes every non-empty line after the first with `indent`.
pub fn reindent(text: &str, indent: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{}", prefix_non_empty_lines(rest, indent)),
        None => text.to_string(),
    }
}

fn prefix_non_empty_lines(text: &str, indent: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{SerializeContext, Serialized, block_literal, reindent, serialize};
    use crate::engine::SkipReason;
    use crate::indent::IndentationUnit;
    use crate::inspect::LiteralInspector;
    use crate::policy::Policy;
    use crate::subject::Subject;

    fn serialize_with(
        subject: &Subject,
        label: &str,
        unit: IndentationUnit,
        anchor_indent: &str,
    ) -> Result<Serialized, SkipReason> {
        let policy = Policy::default();
        let inspector = LiteralInspector::default();
        let context = SerializeContext {
            unit,
            anchor_indent,
            inspector: &inspector,
        };
        serialize(subject, label, policy.rule_for(label), &context)
    }

    #[test]
    fn single_line_string_under_equality_label_is_an_inline_literal() {
        let serialized = serialize_with(
            &Subject::string("foo"),
            "to equal",
            IndentationUnit::spaces(2),
            "    ",
        )
        .expect("serializes");

        assert_eq!(serialized.text, "'foo'");
        assert_eq!(serialized.label, "to equal");
    }

    #[test]
    fn snapshot_strings_always_become_indented_block_literals() {
        let serialized = serialize_with(
            &Subject::string("foo"),
            "to match snapshot",
            IndentationUnit::spaces(2),
            "  ",
        )
        .expect("serializes");

        assert_eq!(serialized.text, "`\n    foo\n  `");
        assert_eq!(serialized.label, "to match snapshot");
    }

    #[test]
    fn multi_line_equality_strings_use_the_tagged_block() {
        let serialized = serialize_with(
            &Subject::string("foo\nbar"),
            "to equal",
            IndentationUnit::spaces(4),
            "        ",
        )
        .expect("serializes");

        assert_eq!(
            serialized.text,
            "expect.unindent`\n            foo\n            bar\n        `"
        );
    }

    #[test]
    fn empty_lines_stay_empty_and_whitespace_lines_are_indented() {
        let unit = IndentationUnit::spaces(2);
        let empty = serialize_with(&Subject::string("foo\n\nbar"), "to match snapshot", unit, "  ")
            .expect("serializes");
        let blank = serialize_with(&Subject::string("foo\n \nbar"), "to match snapshot", unit, "  ")
            .expect("serializes");
        let trailing = serialize_with(&Subject::string("foo\n"), "to match snapshot", unit, "  ")
            .expect("serializes");

        assert_eq!(empty.text, "`\n    foo\n\n    bar\n  `");
        assert_eq!(blank.text, "`\n    foo\n     \n    bar\n  `");
        assert_eq!(trailing.text, "`\n    foo\n\n  `");
    }

    #[test]
    fn simple_trees_are_inspected_inline() {
        let subject = Subject::object([
            ("a", Subject::number(456.0)),
            ("b", Subject::object([("c", Subject::number(789.0))])),
        ]);

        let equal = serialize_with(&subject, "to equal", IndentationUnit::spaces(2), "")
            .expect("serializes");
        let unknown = serialize_with(&subject, "to satisfy", IndentationUnit::spaces(2), "")
            .expect("simple trees need no rule");

        assert_eq!(equal.text, "{ a: 456, b: { c: 789 } }");
        assert_eq!(unknown.text, equal.text);
        assert_eq!(unknown.label, "to satisfy");
    }

    #[test]
    fn opaque_values_switch_to_the_inspect_label() {
        let subject = Subject::instance("Foo", [("a", Subject::number(1.0))]);

        let equal = serialize_with(&subject, "to equal", IndentationUnit::spaces(2), "")
            .expect("serializes");
        let snapshot = serialize_with(&subject, "to match snapshot", IndentationUnit::spaces(2), "  ")
            .expect("serializes");

        assert_eq!(equal.label, "to inspect as");
        assert_eq!(equal.text, "'Foo({ a: 1 })'");
        assert_eq!(snapshot.label, "to inspect as snapshot");
        assert_eq!(snapshot.text, "`\n    Foo({ a: 1 })\n  `");
    }

    #[test]
    fn circular_and_unknown_label_subjects_are_skipped() {
        let cyclic = Subject::object([("self", Subject::circular("$"))]);
        let instance = Subject::instance::<&str>("Foo", []);

        assert_eq!(
            serialize_with(&cyclic, "to match snapshot", IndentationUnit::spaces(2), ""),
            Err(SkipReason::UnserializableValue)
        );
        assert_eq!(
            serialize_with(&instance, "to satisfy", IndentationUnit::spaces(2), ""),
            Err(SkipReason::UnsupportedLabel)
        );
    }

    #[test]
    fn block_literal_escapes_template_syntax() {
        assert_eq!(
            block_literal("a`b ${c} \\d", None, &IndentationUnit::spaces(2)),
            "`\n  a\\`b \\${c} \\\\d\n`"
        );
        assert_eq!(
            block_literal("x", Some("tag"), &IndentationUnit::tabs(1)),
            "tag`\n\tx\n`"
        );
    }

    #[test]
    fn reindent_leaves_the_first_line_alone() {
        assert_eq!(reindent("{\n  a: 1\n}", "    "), "{\n      a: 1\n    }");
        assert_eq!(reindent("single", "    "), "single");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_reindent_only_adds_indent_to_non_empty_lines(
            lines in proptest::collection::vec("[a-z ]{0,8}", 1..8),
            width in 0usize..8,
        ) {
            let text = lines.join("\n");
            let indent = " ".repeat(width);
            let reindented = reindent(&text, &indent);

            let original_lines: Vec<&str> = text.split('\n').collect();
            let new_lines: Vec<&str> = reindented.split('\n').collect();
            prop_assert_eq!(original_lines.len(), new_lines.len());
            prop_assert_eq!(original_lines[0], new_lines[0]);
            for (before, after) in original_lines.iter().zip(&new_lines).skip(1) {
                if before.is_empty() {
                    prop_assert!(after.is_empty());
                } else {
                    prop_assert_eq!(after.strip_prefix(indent.as_str()), Some(*before));
                }
            }
        }
    }
}
