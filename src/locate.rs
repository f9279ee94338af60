use std::iter::Peekable;
use std::str::Chars;

use tree_sitter::{Node, TreeCursor};

use crate::document::SourceDocument;
use crate::request::FixStatus;

/// Depth-first, pre-order walk over a syntax tree.
pub struct Preorder<'tree> {
    cursor: TreeCursor<'tree>,
    finished: bool,
}

impl<'tree> Preorder<'tree> {
    pub fn new(root: Node<'tree>) -> Self {
        Self {
            cursor: root.walk(),
            finished: false,
        }
    }
}

impl<'tree> Iterator for Preorder<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let node = self.cursor.node();
        if !self.cursor.goto_first_child() {
            loop {
                if self.cursor.goto_next_sibling() {
                    break;
                }
                if !self.cursor.goto_parent() {
                    self.finished = true;
                    break;
                }
            }
        }

        Some(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// `expect(subject, label)` or `expect(subject, label, expected)`.
    Plain,
    /// Extra arguments between the subject and the final label.
    Compound,
}

/// An assertion call whose arguments the planner can rewrite.
#[derive(Debug, Clone)]
pub struct CallSite<'tree> {
    pub node: Node<'tree>,
    pub arguments: Vec<Node<'tree>>,
}

impl<'tree> CallSite<'tree> {
    pub fn shape(&self) -> CallShape {
        if self.arguments.len() == 2 {
            CallShape::Plain
        } else {
            CallShape::Compound
        }
    }

    pub fn start_byte(&self) -> usize {
        self.node.start_byte()
    }

    /// The label argument: last for `missing`, second to last for `mismatch`.
    /// Never the subject.
    pub fn label_argument(&self, status: FixStatus) -> Option<Node<'tree>> {
        let from_end = match status {
            FixStatus::Missing => 1,
            FixStatus::Mismatch => 2,
        };
        self.arguments
            .len()
            .checked_sub(from_end)
            .filter(|index| *index >= 1)
            .map(|index| self.arguments[index])
    }

    /// The stale expected value of a `mismatch`.
    pub fn expected_argument(&self) -> Option<Node<'tree>> {
        if self.arguments.len() >= 3 {
            self.arguments.last().copied()
        } else {
            None
        }
    }

    /// Node whose line indentation is the base for multi-line replacements:
    /// the third argument when present, else the second.
    pub fn anchor(&self) -> Node<'tree> {
        self.arguments
            .get(2)
            .copied()
            .unwrap_or(self.arguments[1])
    }
}

/// Finds the assertion call starting at the 1-based `line` and `column`.
pub fn find_call_site<'tree>(
    document: &'tree SourceDocument,
    entry_point: &str,
    line: usize,
    column: usize,
) -> Option<CallSite<'tree>> {
    let source = document.text.as_str();
    Preorder::new(document.tree.root_node())
        .filter(|node| node.kind() == "call_expression")
        .filter(|node| node.start_position().row + 1 == line)
        .filter(|node| utf16_column(source, *node) + 1 == column)
        .find_map(|node| assertion_call(node, source, entry_point))
}

fn assertion_call<'tree>(node: Node<'tree>, source: &str, entry_point: &str) -> Option<CallSite<'tree>> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "identifier" || callee.utf8_text(source.as_bytes()).ok()? != entry_point {
        return None;
    }

    let argument_list = node.child_by_field_name("arguments")?;
    if argument_list.kind() != "arguments" {
        return None;
    }
    let mut cursor = argument_list.walk();
    let arguments: Vec<Node<'tree>> = argument_list
        .named_children(&mut cursor)
        .filter(|argument| argument.kind() != "comment")
        .collect();

    (arguments.len() >= 2).then_some(CallSite { node, arguments })
}

/// Column of the node's first character in UTF-16 code units.
fn utf16_column(source: &str, node: Node<'_>) -> usize {
    let start = node.start_byte();
    let byte_column = node.start_position().column;
    start
        .checked_sub(byte_column)
        .and_then(|line_start| source.get(line_start..start))
        .map_or(byte_column, |prefix| prefix.encode_utf16().count())
}

/// Value of a plain string literal (or a template without substitutions).
pub fn string_literal_value(node: Node<'_>, source: &str) -> Option<String> {
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let body = match node.kind() {
        "string" => text.get(1..text.len().checked_sub(1)?)?,
        "template_string" => {
            let mut cursor = node.walk();
            if node
                .named_children(&mut cursor)
                .any(|child| child.kind() == "template_substitution")
            {
                return None;
            }
            text.get(1..text.len().checked_sub(1)?)?
        }
        _ => return None,
    };
    unescape(body)
}

/// Decodes JavaScript string escapes; `None` for malformed escapes or lone
/// surrogates.
fn unescape(body: &str) -> Option<String> {
    let mut value = String::with_capacity(body.len());
    let mut characters = body.chars().peekable();
    while let Some(character) = characters.next() {
        if character != '\\' {
            value.push(character);
            continue;
        }
        match characters.next()? {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !characters.peek().is_some_and(char::is_ascii_digit) => value.push('\0'),
            'x' => {
                let code = hex_digits(&mut characters, 2)?;
                value.push(char::from_u32(code)?);
            }
            'u' => {
                let unit = unicode_escape(&mut characters)?;
                if (0xD800..0xDC00).contains(&unit) {
                    if characters.next()? != '\\' || characters.next()? != 'u' {
                        return None;
                    }
                    let low = unicode_escape(&mut characters)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    value.push(char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))?);
                } else {
                    value.push(char::from_u32(unit)?);
                }
            }
            '\r' => {
                if characters.peek() == Some(&'\n') {
                    characters.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            digit if digit.is_ascii_digit() => return None,
            other => value.push(other),
        }
    }
    Some(value)
}

fn unicode_escape(characters: &mut Peekable<Chars<'_>>) -> Option<u32> {
    if characters.peek() != Some(&'{') {
        return hex_digits(characters, 4);
    }
    characters.next();
    let mut code = 0u32;
    let mut digits = 0;
    loop {
        let character = characters.next()?;
        if character == '}' {
            break;
        }
        code = code.checked_mul(16)?.checked_add(character.to_digit(16)?)?;
        digits += 1;
    }
    (digits > 0 && code <= 0x10FFFF).then_some(code)
}

fn hex_digits(characters: &mut Peekable<Chars<'_>>, count: usize) -> Option<u32> {
    (0..count).try_fold(0u32, |code, _| Some(code * 16 + characters.next()?.to_digit(16)?))
}
