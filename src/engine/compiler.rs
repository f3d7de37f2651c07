//! Rule line compilation.
//!
//! One line of rule syntax becomes a [`RuleLine`]:
//!
//! - `name = member1 member2 {othercat}` defines a category. `{othercat}`
//!   tokens on the right-hand side are replaced with the members of already
//!   defined categories before splitting, which permits composition.
//! - `from > to [/ before_after] [! unbefore_unafter]` is a rule. The two
//!   condition fields split on a single `_`: text before it must precede the
//!   match, text after it must follow. Any field may be absent.
//! - `rule1 | rule2 | ...` is an alternation: each piece compiles as an
//!   independent rule, and at application time the first one that matches
//!   wins.
//!
//! Special tokens inside patterns: `0` for the empty string (deletion and
//! insertion rules), `#` for a word boundary, `{name}` for a category
//! alternation, and `{n:name}` for a numbered category captured under slot
//! `n`. References to categories that are not (yet) defined stay literal
//! text rather than failing: rules may be written above their categories,
//! they simply will not match until the category exists.

use crate::error::Error;
use crate::{BoundaryKind, CategoryTable, Pattern, PatternElem, Rule, RuleLine, Template, TemplateElem};

/// Compile one line of rule syntax against the current category table.
pub(crate) fn compile_line(line: &str, cats: &CategoryTable) -> Result<RuleLine, Error> {
    let sides: Vec<&str> = line.split(" = ").collect();
    if sides.len() == 2 {
        let name = sides[0].trim().to_string();
        let body = cats.expand_members(sides[1]);
        let members = body.split_whitespace().map(str::to_string).collect();
        return Ok(RuleLine::Category { name, members });
    }

    if line.contains(" | ") {
        let alternatives = line
            .split(" | ")
            .map(|part| compile_rule(part, cats))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(RuleLine::Alternation(alternatives));
    }

    Ok(RuleLine::Single(compile_rule(line, cats)?))
}

/// Compile a plain `from > to [/ cond] [! cond]` rule.
fn compile_rule(line: &str, cats: &CategoryTable) -> Result<Rule, Error> {
    // Negative conditions come after positive ones, so peel from the right:
    // `a > b / c_d ! e_f` -> head `a > b / c_d`, negatives `e_f`.
    let (head, negatives) = match line.split_once(" ! ") {
        Some((head, rest)) => (head, Some(rest)),
        None => (line, None),
    };
    let (core, conditions) = match head.split_once(" / ") {
        Some((core, rest)) => (core, Some(rest)),
        None => (head, None),
    };
    let (from, to) = core
        .split_once(" > ")
        .ok_or_else(|| Error::MalformedRule(line.to_string()))?;

    let (before, after) = split_condition(conditions);
    let (unbefore, unafter) = split_condition(negatives);

    Ok(Rule {
        text: line.to_string(),
        from: compile_pattern(zero_to_empty(from), cats, BoundaryKind::Either),
        to: compile_template(zero_to_empty(to), cats),
        before: compile_context(before, cats, BoundaryKind::Start),
        after: compile_context(after, cats, BoundaryKind::End),
        unbefore: compile_context(unbefore, cats, BoundaryKind::Start),
        unafter: compile_context(unafter, cats, BoundaryKind::End),
    })
}

/// Split a condition field on its `_` marker.
///
/// `c_d` -> before `c`, after `d`; a field with no `_` is all before-context.
fn split_condition(field: Option<&str>) -> (Option<&str>, Option<&str>) {
    match field {
        None => (None, None),
        Some(text) => match text.split_once('_') {
            Some((before, after)) => (Some(before), Some(after)),
            None => (Some(text), None),
        },
    }
}

/// The literal token `0` denotes the empty string.
fn zero_to_empty(text: &str) -> &str {
    if text == "0" { "" } else { text }
}

/// An empty context is no context at all.
fn compile_context(text: Option<&str>, cats: &CategoryTable, boundary: BoundaryKind) -> Option<Pattern> {
    let text = text?;
    if text.is_empty() {
        return None;
    }
    Some(compile_pattern(text, cats, boundary))
}

/// Compile pattern text into a sequence of matcher elements.
///
/// Category members are embedded with their definition indices and sorted
/// longest-first, so a multigraph member always takes precedence over a
/// member that is its prefix.
fn compile_pattern(text: &str, cats: &CategoryTable, boundary: BoundaryKind) -> Pattern {
    let token = regex!(r"\{(\d*):?(\w*)\}");
    let mut elems = Vec::new();
    let mut last = 0;

    for caps in token.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str())).unwrap_or((0, 0, ""));
        push_literal(&mut elems, &text[last..whole.0], boundary);
        last = whole.1;

        let digits = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());
        let slot = if digits.is_empty() { Ok(None) } else { digits.parse::<u8>().map(Some) };

        match (slot, cats.get(name)) {
            (Ok(slot), Some(members)) => {
                elems.push(PatternElem::Category { slot, members: ordered_members(members) });
            }
            _ => {
                if std::env::var_os("SOUNDLAW_DEBUG_RULES").is_some() {
                    eprintln!("[compile_pattern] leaving {:?} literal (unknown category)", whole.2);
                }
                push_literal(&mut elems, whole.2, boundary);
            }
        }
    }
    push_literal(&mut elems, &text[last..], boundary);
    elems
}

/// Members paired with their definition index, sorted longest-first; ties
/// keep definition order.
fn ordered_members(members: &[String]) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = members.iter().cloned().enumerate().collect();
    out.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
    out
}

/// Push literal text, splitting out `#` boundary markers.
fn push_literal(elems: &mut Pattern, text: &str, boundary: BoundaryKind) {
    let mut rest = text;
    while let Some(i) = rest.find('#') {
        if i > 0 {
            elems.push(PatternElem::Literal(rest[..i].to_string()));
        }
        elems.push(PatternElem::Boundary(boundary));
        rest = &rest[i + 1..];
    }
    if !rest.is_empty() {
        elems.push(PatternElem::Literal(rest.to_string()));
    }
}

/// Compile output-template text.
///
/// Only *numbered* category tokens become slots; `{name}` without a number
/// has no binding to resolve at output time and stays literal, as does any
/// token naming an unknown category.
fn compile_template(text: &str, cats: &CategoryTable) -> Template {
    let token = regex!(r"\{(\d*):?(\w*)\}");
    let mut elems = Vec::new();
    let mut last = 0;

    for caps in token.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str())).unwrap_or((0, 0, ""));
        if whole.0 > last {
            elems.push(TemplateElem::Literal(text[last..whole.0].to_string()));
        }
        last = whole.1;

        let digits = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());
        match (digits.parse::<u8>(), cats.get(name)) {
            (Ok(slot), Some(members)) => {
                elems.push(TemplateElem::Slot {
                    slot,
                    members: members.to_vec(),
                    raw: whole.2.to_string(),
                });
            }
            _ => elems.push(TemplateElem::Literal(whole.2.to_string())),
        }
    }
    if last < text.len() {
        elems.push(TemplateElem::Literal(text[last..].to_string()));
    }
    elems
}
