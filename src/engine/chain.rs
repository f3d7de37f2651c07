//! Language-path chain resolution.
//!
//! Positions in the derivation tree of a language family are dotted paths
//! (`proto.west.branch`), and each position names one rule file. Walking
//! from a start path to an end path one segment at a time enumerates every
//! intermediate file on that lineage — exclusive of the start (the word is
//! already *in* that stage, which has no rules of its own to apply),
//! inclusive of the end.
//!
//! An end path written with a leading dot is relative to its pair's start;
//! otherwise it must descend from the start, dot-aligned. Pairs are
//! processed in sequence, so a chain can walk one lineage and then graft on
//! an unrelated one (borrowing/contact influence) with a second pair whose
//! start need not equal the first pair's end.

use crate::ChainPair;
use crate::error::Error;

/// Expand chain pairs into the ordered list of rule-file identifiers.
///
/// ```text
/// [("a", "a.b.c")]            -> ["a.b", "a.b.c"]
/// [("a", ".b.c")]             -> ["a.b", "a.b.c"]
/// [("a", "a.b"), ("x", "x.y")] -> ["a.b", "x.y"]
/// ```
pub(crate) fn expand_pairs(pairs: &[ChainPair]) -> Result<Vec<String>, Error> {
    let mut steps = Vec::new();
    for pair in pairs {
        let mut cur = pair.start.clone();
        let mut rest = if pair.end.starts_with('.') {
            pair.end.clone()
        } else {
            relative_suffix(&pair.start, &pair.end).ok_or_else(|| Error::UnrelatedChainPair {
                start: pair.start.clone(),
                end: pair.end.clone(),
            })?
        };

        while !rest.is_empty() {
            let (segment, remainder) = match rest[1..].split_once('.') {
                Some((segment, remainder)) => (segment.to_string(), format!(".{remainder}")),
                None => (rest[1..].to_string(), String::new()),
            };
            cur = if cur.is_empty() { segment } else { format!("{cur}.{segment}") };
            rest = remainder;
            steps.push(cur.clone());
        }
    }
    Ok(steps)
}

/// The part of `end` below `start`, as a leading-dot suffix, if `end`
/// descends from `start` (dot-aligned prefix containment).
fn relative_suffix(start: &str, end: &str) -> Option<String> {
    if start.is_empty() {
        if end.is_empty() {
            return Some(String::new());
        }
        return Some(format!(".{end}"));
    }
    if end == start {
        return Some(String::new());
    }
    end.strip_prefix(start)
        .filter(|rest| rest.starts_with('.'))
        .map(str::to_string)
}
