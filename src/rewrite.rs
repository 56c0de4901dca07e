//! Line-level edit primitives shared by every field mutator.
//!
//! Lines keep their original terminators, so `join_lines(split_lines(s)) == s`
//! for any input. A directive is recognized by its key prefix; the lines that
//! carry the key, active or commented, form the directive's family. Only
//! active lines are ever commented, so marker prefixes never stack up.

use crate::error::{ScbError, ScbResult};
use crate::markers::{
    COMMENT, DISPLAY_NAME_PREFIX, ERROR_MARKER, EXPORT_KEY, GAMESCOPE_KEY, LAUNCH_OPTIONS_KEY,
    LEGACY_MARKER, MACHINE_MARKER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    DoubleQuoted,
    SingleQuoted,
    RestOfLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Directive {
    pub(crate) key: &'static str,
    capture: Capture,
}

pub(crate) const GAMESCOPE_ARGS: Directive = Directive {
    key: GAMESCOPE_KEY,
    capture: Capture::DoubleQuoted,
};

pub(crate) const LAUNCH_OPTIONS: Directive = Directive {
    key: LAUNCH_OPTIONS_KEY,
    capture: Capture::SingleQuoted,
};

pub(crate) const EXPORT: Directive = Directive {
    key: EXPORT_KEY,
    capture: Capture::RestOfLine,
};

impl Directive {
    /// Value following the key, or `None` when the quoting is broken.
    fn capture(&self, rest: &str) -> Option<String> {
        match self.capture {
            Capture::DoubleQuoted => quoted(rest, '"'),
            Capture::SingleQuoted => quoted(rest, '\''),
            Capture::RestOfLine => Some(rest.to_string()),
        }
    }

    pub(crate) fn render(&self, value: &str) -> String {
        match self.capture {
            Capture::DoubleQuoted => format!("{}\"{}\"\n", self.key, value),
            Capture::SingleQuoted => format!("{}'{}'\n", self.key, value),
            Capture::RestOfLine => format!("{}{}\n", self.key, value),
        }
    }
}

fn quoted(rest: &str, quote: char) -> Option<String> {
    let inner = rest.strip_prefix(quote)?;
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineState {
    Active,
    MachineCommented,
    ErrorCommented,
    Commented,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FamilyLine {
    pub(crate) index: usize,
    pub(crate) state: LineState,
    /// `None` for lines whose quoting cannot be parsed.
    pub(crate) value: Option<String>,
}

pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

pub(crate) fn join_lines(lines: &[String]) -> String {
    lines.concat()
}

/// Line content without its terminator.
pub(crate) fn body(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn terminator(line: &str) -> &str {
    &line[body(line).len()..]
}

fn strip_comment(text: &str) -> Option<(LineState, &str)> {
    let state = if text.starts_with(ERROR_MARKER) {
        LineState::ErrorCommented
    } else if text.starts_with(MACHINE_MARKER) {
        LineState::MachineCommented
    } else if text.starts_with(COMMENT) {
        LineState::Commented
    } else {
        return None;
    };

    let mut rest = text;
    while let Some(stripped) = rest
        .strip_prefix(ERROR_MARKER)
        .or_else(|| rest.strip_prefix(MACHINE_MARKER))
        .or_else(|| rest.strip_prefix(LEGACY_MARKER))
    {
        rest = stripped;
    }
    if rest.len() == text.len() {
        rest = &text[COMMENT.len()..];
    }
    Some((state, rest))
}

fn classify(line: &str, directive: &Directive) -> Option<FamilyLine> {
    let text = body(line);
    let (state, uncommented) = if text.starts_with(directive.key) {
        (LineState::Active, text)
    } else {
        strip_comment(text)?
    };
    let rest = uncommented.strip_prefix(directive.key)?;
    Some(FamilyLine {
        index: 0,
        state,
        value: directive.capture(rest),
    })
}

/// All lines carrying the directive's key, in file order.
///
/// A commented line counts only when the key follows the marker or `#`
/// directly. Line 1 never counts when it holds the display name.
pub(crate) fn family(lines: &[String], directive: &Directive) -> Vec<FamilyLine> {
    lines
        .iter()
        .enumerate()
        .filter(|(index, line)| !(*index == 0 && line.starts_with(DISPLAY_NAME_PREFIX)))
        .filter_map(|(index, line)| {
            classify(line, directive).map(|member| FamilyLine { index, ..member })
        })
        .collect()
}

/// First active, well-formed instance of the directive.
pub(crate) fn find(lines: &[String], directive: &Directive) -> Option<(usize, String)> {
    family(lines, directive)
        .into_iter()
        .find_map(|member| match (member.state, member.value) {
            (LineState::Active, Some(value)) => Some((member.index, value)),
            _ => None,
        })
}

pub(crate) fn has_exact_line(lines: &[String], prefix: &str) -> bool {
    lines.iter().any(|line| line.starts_with(prefix))
}

fn disable(line: &str, well_formed: bool) -> String {
    if well_formed {
        format!("{MACHINE_MARKER}{line}")
    } else {
        format!("{ERROR_MARKER}{line}")
    }
}

fn uncomment(line: &str) -> String {
    match strip_comment(body(line)) {
        Some((_, inner)) => format!("{}{}", inner, terminator(line)),
        None => line.to_string(),
    }
}

fn insert_line(lines: &mut Vec<String>, at: usize, line: String) {
    if at == lines.len()
        && let Some(previous) = lines.last_mut()
        && !previous.ends_with('\n')
    {
        previous.push('\n');
    }
    lines.insert(at, line);
}

fn append_position(members: &[FamilyLine], lines: &[String]) -> usize {
    members
        .last()
        .map(|member| member.index + 1)
        .unwrap_or(lines.len())
}

/// Makes `value` the single active instance of a single-valued directive.
///
/// Returns `false` without touching `lines` when that is already the case.
pub(crate) fn replace_or_append(
    lines: &mut Vec<String>,
    directive: &Directive,
    value: &str,
) -> bool {
    let members = family(lines, directive);
    let active: Vec<&FamilyLine> = members
        .iter()
        .filter(|member| member.state == LineState::Active)
        .collect();
    if let [only] = active.as_slice()
        && only.value.as_deref() == Some(value)
    {
        return false;
    }

    for member in &active {
        lines[member.index] = disable(&lines[member.index], member.value.is_some());
    }

    if let Some(previous) = members.iter().find(|member| {
        member.state == LineState::MachineCommented && member.value.as_deref() == Some(value)
    }) {
        lines[previous.index] = uncomment(&lines[previous.index]);
        return true;
    }

    let at = append_position(&members, lines);
    insert_line(lines, at, directive.render(value));
    true
}

/// Comments every active instance, or restores the last machine-commented one.
pub(crate) fn set_active(lines: &mut [String], directive: &Directive, active: bool) -> bool {
    let members = family(lines, directive);
    if active {
        if members
            .iter()
            .any(|member| member.state == LineState::Active)
        {
            return false;
        }
        let Some(restored) = members.iter().rev().find(|member| {
            member.state == LineState::MachineCommented && member.value.is_some()
        }) else {
            return false;
        };
        lines[restored.index] = uncomment(&lines[restored.index]);
        return true;
    }

    let mut changed = false;
    for member in members
        .iter()
        .filter(|member| member.state == LineState::Active)
    {
        lines[member.index] = disable(&lines[member.index], member.value.is_some());
        changed = true;
    }
    changed
}

/// Stores `value` disabled: no active instance remains and exactly one
/// machine-commented line carrying `value` ends the family, which is the line
/// `set_active(.., true)` brings back.
pub(crate) fn park(lines: &mut Vec<String>, directive: &Directive, value: &str) -> bool {
    let mut changed = set_active(lines, directive, false);
    let members = family(lines, directive);
    let last = members.last().map(|member| member.index);
    let existing = members
        .iter()
        .find(|member| {
            member.state == LineState::MachineCommented && member.value.as_deref() == Some(value)
        })
        .map(|member| member.index);

    match (existing, last) {
        (Some(index), Some(last)) if index == last => {}
        (Some(index), Some(last)) => {
            let line = lines.remove(index);
            insert_line(lines, last, line);
            changed = true;
        }
        _ => {
            let at = append_position(&members, lines);
            insert_line(
                lines,
                at,
                format!("{}{}", MACHINE_MARKER, directive.render(value)),
            );
            changed = true;
        }
    }
    changed
}

/// Most recent machine-commented value, i.e. what `set_active(.., true)` restores.
pub(crate) fn parked_value(lines: &[String], directive: &Directive) -> Option<String> {
    family(lines, directive)
        .into_iter()
        .rev()
        .find(|member| member.state == LineState::MachineCommented && member.value.is_some())
        .and_then(|member| member.value)
}

/// Reconciles a multi-valued directive against `values` by value, not position.
///
/// Matching active lines stay, matching machine-commented lines come back,
/// other active lines are commented and the leftovers are inserted after the
/// last family line. `values` are expected trimmed and free of duplicates.
pub(crate) fn reconcile(lines: &mut Vec<String>, directive: &Directive, values: &[String]) -> bool {
    let mut pending: Vec<&str> = values.iter().map(String::as_str).collect();
    let members = family(lines, directive);
    let mut changed = false;

    for member in members
        .iter()
        .filter(|member| member.state == LineState::Active)
    {
        let value = member.value.as_deref().map(str::trim);
        match value.and_then(|v| pending.iter().position(|p| *p == v)) {
            Some(pos) => {
                pending.remove(pos);
            }
            None => {
                lines[member.index] = disable(&lines[member.index], member.value.is_some());
                changed = true;
            }
        }
    }

    for member in members
        .iter()
        .filter(|member| member.state == LineState::MachineCommented)
    {
        let value = member.value.as_deref().map(str::trim);
        if let Some(pos) = value.and_then(|v| pending.iter().position(|p| *p == v)) {
            pending.remove(pos);
            lines[member.index] = uncomment(&lines[member.index]);
            changed = true;
        }
    }

    let mut at = append_position(&members, lines);
    for value in pending {
        insert_line(lines, at, directive.render(value));
        at += 1;
        changed = true;
    }
    changed
}

/// Drops adjacent identical lines within the directive's family.
pub(crate) fn collapse_adjacent_duplicates(lines: &mut Vec<String>, directive: &Directive) -> bool {
    let before = lines.len();
    let mut index = 1;
    while index < lines.len() {
        if body(&lines[index]) == body(&lines[index - 1])
            && classify(&lines[index], directive).is_some()
        {
            let removed = lines.remove(index);
            if !removed.ends_with('\n') {
                lines[index - 1] = body(&lines[index - 1]).to_string();
            }
        } else {
            index += 1;
        }
    }
    lines.len() != before
}

/// Guarantees a usable `SCB_GAMESCOPE_ARGS` directive.
///
/// Malformed active lines get the error marker and, unless another well-formed
/// active line exists, a fresh empty line right below. A file that never had
/// the directive materialized gets an active empty line after the template's
/// commented example, or at the end. A directive parked by this tool is left
/// disabled.
pub(crate) fn ensure_gamescope_line(lines: &mut Vec<String>) -> bool {
    let members = family(lines, &GAMESCOPE_ARGS);
    let has_valid_active = members
        .iter()
        .any(|member| member.state == LineState::Active && member.value.is_some());
    let malformed: Vec<usize> = members
        .iter()
        .filter(|member| member.state == LineState::Active && member.value.is_none())
        .map(|member| member.index)
        .collect();

    for &index in &malformed {
        lines[index] = disable(&lines[index], false);
    }
    if has_valid_active {
        return !malformed.is_empty();
    }
    if let Some(&first) = malformed.first() {
        insert_line(lines, first + 1, GAMESCOPE_ARGS.render(""));
        return true;
    }
    if members
        .iter()
        .any(|member| member.state == LineState::MachineCommented)
    {
        return false;
    }

    let at = members
        .iter()
        .find(|member| member.state == LineState::Commented)
        .map(|member| member.index + 1)
        .unwrap_or(lines.len());
    insert_line(lines, at, GAMESCOPE_ARGS.render(""));
    true
}

/// Batch exact-prefix edit: the first line starting with `prefixes[i]` gets that
/// prefix replaced by `replacements[i]`, trailing content kept. A prefix with
/// no match appends `replacements[i]` unless a line already starts with it.
pub(crate) fn edit_exact_lines<P, R>(
    lines: &mut Vec<String>,
    prefixes: &[P],
    replacements: &[R],
) -> ScbResult<bool>
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    if prefixes.len() != replacements.len() {
        return Err(ScbError::MismatchedEdit {
            prefixes: prefixes.len(),
            replacements: replacements.len(),
        });
    }
    if prefixes
        .iter()
        .map(AsRef::as_ref)
        .chain(replacements.iter().map(AsRef::as_ref))
        .any(|text| text.contains(['\n', '\r']))
    {
        return Err(ScbError::InvalidValue {
            field: "exact line",
            reason: "must be a single line",
        });
    }

    let mut changed = false;
    for (prefix, replacement) in prefixes.iter().zip(replacements) {
        let (prefix, replacement) = (prefix.as_ref(), replacement.as_ref());
        if let Some(index) = lines.iter().position(|line| line.starts_with(prefix)) {
            let edited = format!("{}{}", replacement, &lines[index][prefix.len()..]);
            if edited != lines[index] {
                lines[index] = edited;
                changed = true;
            }
        } else if !has_exact_line(lines, replacement) {
            let at = lines.len();
            insert_line(lines, at, format!("{replacement}\n"));
            changed = true;
        }
    }
    Ok(changed)
}
