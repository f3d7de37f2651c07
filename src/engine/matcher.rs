//! Structural matching with numbered-category unification.
//!
//! Matching is a two-phase process:
//!
//! 1. **Structural scan.** At each candidate position the left contexts are
//!    checked (`before` must match ending exactly at the site, `unbefore`
//!    must not), then `from` is matched forward with backtracking over
//!    category members. The right contexts are the continuation of that
//!    search: when `from` runs out of elements, `unafter` must fail and
//!    `after` must match at the seam, otherwise the search backtracks into
//!    earlier member choices — the same behavior a regex alternation inside
//!    a lookahead would have.
//! 2. **Unification.** Every numbered category element that matched recorded
//!    a `(slot, member_index)` capture. The captures are folded into a
//!    `slot -> index` map; two captures for the same slot with different
//!    indices invalidate the site. This is a correctness check the
//!    structural phase cannot express — the member chosen for `{0:V}` in a
//!    context and the one chosen in `from` are picked independently — and a
//!    failed check is a rejection signal, never an error.
//!
//! A site rejected by unification still advances the scan past its end, so a
//! bad site shadows overlapping positions the same way a discarded regex
//! match would. Accepted sites are non-overlapping and ordered left to
//! right; zero-width sites (insertion rules) advance the scan by one
//! character.

use crate::{BoundaryKind, MatchSite, Pattern, PatternElem, Rule};
use std::collections::BTreeMap;

/// One numbered-category observation from the structural phase.
#[derive(Debug, Clone, Copy)]
struct Capture {
    slot: u8,
    index: usize,
}

/// Find all non-overlapping, unification-consistent matches of `rule` in
/// `word`, ordered left to right.
pub(crate) fn find_matches(word: &str, rule: &Rule) -> Vec<MatchSite> {
    let mut sites = Vec::new();
    let mut pos = 0;
    while pos <= word.len() {
        match raw_match_at(word, rule, pos) {
            Some((end, captures)) => {
                match unify(&captures) {
                    Some(bindings) => sites.push(MatchSite { start: pos, end, bindings }),
                    None => {
                        if std::env::var_os("SOUNDLAW_DEBUG_RULES").is_some() {
                            eprintln!(
                                "[find_matches] {:?}: numbered categories disagree at {pos}..{end}, match discarded",
                                rule.text
                            );
                        }
                    }
                }
                pos = if end > pos { end } else { next_char(word, pos) };
            }
            None => pos = next_char(word, pos),
        }
    }
    sites
}

/// Structural match attempt at one position. Returns the end of the matched
/// span and the raw captures, before any unification.
fn raw_match_at(word: &str, rule: &Rule, pos: usize) -> Option<(usize, Vec<Capture>)> {
    if !word.is_char_boundary(pos) {
        return None;
    }
    let mut captures = Vec::new();

    if let Some(pattern) = &rule.before {
        match_ending_at(word, pattern, pos, &mut captures)?;
    }
    if let Some(pattern) = &rule.unbefore {
        let mut scratch = Vec::new();
        if match_ending_at(word, pattern, pos, &mut scratch).is_some() {
            return None;
        }
    }

    let end = match_from(word, rule, &rule.from, pos, &mut captures)?;
    Some((end, captures))
}

/// Match `elems` (the `from` pattern) forward from `pos`, with the right
/// contexts folded into the base case so that context failure backtracks
/// into member choices.
fn match_from(word: &str, rule: &Rule, elems: &[PatternElem], pos: usize, captures: &mut Vec<Capture>) -> Option<usize> {
    let Some((first, rest)) = elems.split_first() else {
        if let Some(pattern) = &rule.unafter {
            let mut scratch = Vec::new();
            if match_pattern(word, pattern, pos, None, &mut scratch).is_some() {
                return None;
            }
        }
        if let Some(pattern) = &rule.after {
            let undo = captures.len();
            if match_pattern(word, pattern, pos, None, captures).is_none() {
                captures.truncate(undo);
                return None;
            }
        }
        return Some(pos);
    };

    match first {
        PatternElem::Literal(text) => {
            if word[pos..].starts_with(text.as_str()) {
                match_from(word, rule, rest, pos + text.len(), captures)
            } else {
                None
            }
        }
        PatternElem::Boundary(kind) => {
            if boundary_ok(word, pos, *kind) {
                match_from(word, rule, rest, pos, captures)
            } else {
                None
            }
        }
        PatternElem::Category { slot, members, .. } => {
            for (index, member) in members {
                if !word[pos..].starts_with(member.as_str()) {
                    continue;
                }
                let undo = captures.len();
                if let Some(slot) = slot {
                    captures.push(Capture { slot: *slot, index: *index });
                }
                if let Some(end) = match_from(word, rule, rest, pos + member.len(), captures) {
                    return Some(end);
                }
                captures.truncate(undo);
            }
            None
        }
    }
}

/// Match a context pattern forward from `pos`. With `require_end`, only a
/// parse ending exactly there succeeds.
fn match_pattern(
    word: &str,
    elems: &[PatternElem],
    pos: usize,
    require_end: Option<usize>,
    captures: &mut Vec<Capture>,
) -> Option<usize> {
    if let Some(end) = require_end {
        if pos > end {
            return None;
        }
    }
    let Some((first, rest)) = elems.split_first() else {
        return match require_end {
            Some(end) if pos != end => None,
            _ => Some(pos),
        };
    };

    match first {
        PatternElem::Literal(text) => {
            if word[pos..].starts_with(text.as_str()) {
                match_pattern(word, rest, pos + text.len(), require_end, captures)
            } else {
                None
            }
        }
        PatternElem::Boundary(kind) => {
            if boundary_ok(word, pos, *kind) {
                match_pattern(word, rest, pos, require_end, captures)
            } else {
                None
            }
        }
        PatternElem::Category { slot, members, .. } => {
            for (index, member) in members {
                if !word[pos..].starts_with(member.as_str()) {
                    continue;
                }
                let undo = captures.len();
                if let Some(slot) = slot {
                    captures.push(Capture { slot: *slot, index: *index });
                }
                if let Some(end) = match_pattern(word, rest, pos + member.len(), require_end, captures) {
                    return Some(end);
                }
                captures.truncate(undo);
            }
            None
        }
    }
}

/// Lookbehind: does some parse of `pattern` end exactly at `end`?
///
/// Start positions are tried right to left, so the shortest lookbehind wins;
/// captures from the winning parse are kept.
fn match_ending_at(word: &str, pattern: &Pattern, end: usize, captures: &mut Vec<Capture>) -> Option<()> {
    let mut start = end;
    loop {
        let undo = captures.len();
        if match_pattern(word, pattern, start, Some(end), captures).is_some() {
            return Some(());
        }
        captures.truncate(undo);
        if start == 0 {
            return None;
        }
        start = prev_char(word, start);
    }
}

/// Fold captures into slot bindings; `None` on any same-slot disagreement.
fn unify(captures: &[Capture]) -> Option<BTreeMap<u8, usize>> {
    let mut bindings = BTreeMap::new();
    for capture in captures {
        match bindings.insert(capture.slot, capture.index) {
            Some(previous) if previous != capture.index => return None,
            _ => {}
        }
    }
    Some(bindings)
}

/// Word-boundary test: edges of the string, or adjacency to whitespace.
fn boundary_ok(word: &str, pos: usize, kind: BoundaryKind) -> bool {
    let start = pos == 0 || word[..pos].ends_with(char::is_whitespace);
    let end = pos == word.len() || word[pos..].starts_with(char::is_whitespace);
    match kind {
        BoundaryKind::Start => start,
        BoundaryKind::End => end,
        BoundaryKind::Either => start || end,
    }
}

fn next_char(word: &str, pos: usize) -> usize {
    match word[pos..].chars().next() {
        Some(c) => pos + c.len_utf8(),
        None => word.len() + 1,
    }
}

fn prev_char(word: &str, pos: usize) -> usize {
    match word[..pos].chars().next_back() {
        Some(c) => pos - c.len_utf8(),
        None => 0,
    }
}
