use std::fmt;

pub const DEFAULT_INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentStyle {
    Spaces,
    Tabs,
}

impl IndentStyle {
    fn character(self) -> char {
        match self {
            Self::Spaces => ' ',
            Self::Tabs => '\t',
        }
    }
}

/// One nesting level of a file: N spaces or N tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentationUnit {
    pub width: usize,
    pub style: IndentStyle,
}

impl IndentationUnit {
    pub fn spaces(width: usize) -> Self {
        Self {
            width,
            style: IndentStyle::Spaces,
        }
    }

    pub fn tabs(width: usize) -> Self {
        Self {
            width,
            style: IndentStyle::Tabs,
        }
    }

    /// Infers the unit of `text`, falling back to `default_width` spaces.
    pub fn for_text(text: &str, default_width: usize) -> Self {
        match detect(text) {
            Some(DetectedIndent {
                amount,
                uses_tabs: true,
            }) => Self::tabs(amount),
            Some(DetectedIndent { amount, .. }) => Self::spaces(amount),
            None => Self::spaces(default_width),
        }
    }
}

impl fmt::Display for IndentationUnit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.width {
            fmt::Write::write_char(formatter, self.style.character())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedIndent {
    pub amount: usize,
    pub uses_tabs: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Votes {
    uses: usize,
    weight: usize,
}

/// Majority vote over indentation deltas between consecutive indented lines.
///
/// Single-space indents are ignored on the first pass so JSDoc continuation
/// lines (` * foo`) do not outvote the real unit.
pub fn detect(text: &str) -> Option<DetectedIndent> {
    let mut votes = collect_votes(text, true);
    if votes.is_empty() {
        votes = collect_votes(text, false);
    }

    // Ties go to the key seen first.
    let mut best: Option<((IndentStyle, usize), Votes)> = None;
    for (key, candidate) in votes {
        let beats_best = best.is_none_or(|(_, current)| {
            (candidate.uses, candidate.weight) > (current.uses, current.weight)
        });
        if beats_best {
            best = Some((key, candidate));
        }
    }

    let ((style, amount), _) = best?;
    (amount > 0).then_some(DetectedIndent {
        amount,
        uses_tabs: style == IndentStyle::Tabs,
    })
}

/// Votes per `(style, delta)` key, in order of first appearance.
fn collect_votes(text: &str, ignore_single_spaces: bool) -> Vec<((IndentStyle, usize), Votes)> {
    let mut votes: Vec<((IndentStyle, usize), Votes)> = Vec::new();
    let mut previous_size = 0usize;
    let mut previous_style: Option<IndentStyle> = None;
    let mut key: Option<(IndentStyle, usize)> = None;

    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }

        let Some((style, size)) = leading_run(line) else {
            previous_size = 0;
            previous_style = None;
            continue;
        };

        if ignore_single_spaces && style == IndentStyle::Spaces && size == 1 {
            continue;
        }

        if previous_style != Some(style) {
            previous_size = 0;
        }
        previous_style = Some(style);

        let delta = size.abs_diff(previous_size);
        previous_size = size;
        let weight = if delta == 0 {
            1
        } else {
            key = Some((style, delta));
            0
        };

        if let Some(current) = key {
            let index = match votes.iter().position(|(seen, _)| *seen == current) {
                Some(index) => index,
                None => {
                    votes.push((current, Votes::default()));
                    votes.len() - 1
                }
            };
            let entry = &mut votes[index].1;
            entry.uses += 1;
            entry.weight += weight;
        }
    }

    votes
}

/// Leading run of a single indentation character; a mixed run counts only
/// its first character kind.
fn leading_run(line: &str) -> Option<(IndentStyle, usize)> {
    let style = match line.chars().next()? {
        ' ' => IndentStyle::Spaces,
        '\t' => IndentStyle::Tabs,
        _ => return None,
    };
    let size = line
        .chars()
        .take_while(|character| *character == style.character())
        .count();
    Some((style, size))
}

/// Indentation of the line that holds `offset`: N spaces when any space is
/// present, otherwise N tabs, otherwise empty.
pub fn line_indentation(text: &str, offset: usize) -> String {
    let offset = offset.min(text.len());
    let line_start = text[..offset].rfind('\n').map_or(0, |index| index + 1);
    let leading: Vec<char> = text[line_start..offset]
        .chars()
        .take_while(|character| *character == ' ' || *character == '\t')
        .collect();

    let spaces = leading.iter().filter(|character| **character == ' ').count();
    let tabs = leading.len() - spaces;

    if spaces > 0 {
        " ".repeat(spaces)
    } else {
        "\t".repeat(tabs)
    }
}
