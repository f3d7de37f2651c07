//! Right-to-left rewriting and rule-list application.

use crate::engine::{compile_line, find_matches};
use crate::error::Error;
use crate::{CategoryTable, MatchSite, Rule, RuleLine, Template, TemplateElem};
use std::collections::BTreeMap;

/// Apply one rule to a word: find all consistent sites, then splice the
/// rendered template over each.
pub(crate) fn apply_rule(word: &str, rule: &Rule) -> String {
    let sites = find_matches(word, rule);
    splice_sites(word, rule, &sites)
}

/// Apply the first alternative that has at least one match; a committed
/// choice, not best-match. A word with no matching alternative is returned
/// unchanged.
pub(crate) fn apply_alternation(word: &str, alternatives: &[Rule]) -> String {
    for rule in alternatives {
        let sites = find_matches(word, rule);
        if !sites.is_empty() {
            return splice_sites(word, rule, &sites);
        }
    }
    word.to_string()
}

/// Splice replacements from the highest start index down, so earlier splices
/// never shift the offsets of sites still to be applied.
fn splice_sites(word: &str, rule: &Rule, sites: &[MatchSite]) -> String {
    let mut out = word.to_string();
    for site in sites.iter().rev() {
        let replacement = render(&rule.to, &site.bindings);
        out.replace_range(site.start..site.end, &replacement);
    }
    out
}

/// Render an output template against one site's slot bindings.
fn render(template: &Template, bindings: &BTreeMap<u8, usize>) -> String {
    let mut out = String::new();
    for elem in template {
        match elem {
            TemplateElem::Literal(text) => out.push_str(text),
            TemplateElem::Slot { slot, members, raw } => {
                match bindings.get(slot).and_then(|&index| members.get(index)) {
                    // The zero sentinel deletes to nothing.
                    Some(member) if member == "0" => {}
                    Some(member) => out.push_str(member),
                    // Unbound slot: keep the token literal.
                    None => out.push_str(raw),
                }
            }
        }
    }
    out
}

/// Apply a list of rule lines to a word, in order, with a fresh category
/// table.
///
/// Returns the final word and the debug trace: category-definition lines
/// appear verbatim, rule lines appear as `"<line> <word-after>"`. The table
/// accumulates across the whole list, so definitions are visible to every
/// later line; callers wanting definitions shared across files concatenate
/// the files into one list.
pub(crate) fn apply_rule_list<S: AsRef<str>>(word: &str, lines: &[S]) -> Result<(String, String), Error> {
    let mut cats = CategoryTable::new();
    let mut word = word.to_string();
    let mut trace = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.as_ref();
        match compile_line(line, &cats)? {
            RuleLine::Category { name, members } => {
                cats.define(name, members);
                trace.push(line.to_string());
            }
            RuleLine::Single(rule) => {
                word = apply_rule(&word, &rule);
                trace.push(format!("{line} {word}"));
            }
            RuleLine::Alternation(alternatives) => {
                word = apply_alternation(&word, &alternatives);
                trace.push(format!("{line} {word}"));
            }
        }
    }
    Ok((word, trace.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(line: &str, cats: &CategoryTable) -> Rule {
        match compile_line(line, cats).unwrap() {
            RuleLine::Single(rule) => rule,
            other => panic!("expected a plain rule, got {other:?}"),
        }
    }

    fn cats() -> CategoryTable {
        let mut cats = CategoryTable::new();
        cats.define("V".to_string(), vec!["a".into(), "e".into(), "i".into(), "o".into(), "u".into()]);
        cats.define("P".to_string(), vec!["p".into(), "t".into(), "k".into()]);
        cats.define("B".to_string(), vec!["b".into(), "d".into(), "g".into()]);
        cats
    }

    #[test]
    fn positional_replacement() {
        let rule = single("a > e / _k", &cats());
        assert_eq!(apply_rule("apak", &rule), "apek");
    }

    #[test]
    fn growing_replacements_do_not_shift_earlier_sites() {
        let rule = single("a > bb", &cats());
        assert_eq!(apply_rule("aka", &rule), "bbkbb");
    }

    #[test]
    fn deletion_never_grows_the_word() {
        let rule = single("a > 0", &cats());
        let word = "banana";
        let out = apply_rule(word, &rule);
        assert_eq!(out, "bnn");
        assert!(out.len() <= word.len());
    }

    #[test]
    fn insertion_at_every_position() {
        let rule = single("0 > x", &cats());
        assert_eq!(apply_rule("ab", &rule), "xaxbx");
    }

    #[test]
    fn cross_category_numbered_rewrite() {
        // Intervocalic voicing: the chosen stop maps to the member at the
        // same index of the voiced series.
        let rule = single("{0:P} > {0:B} / {V}_{V}", &cats());
        assert_eq!(apply_rule("apata", &rule), "abada");
    }

    #[test]
    fn numbered_identity_rewrite_is_identity() {
        let rule = single("{0:V} > {0:V} / {0:V}_", &cats());
        for word in ["aa", "ee", "aei", "kapa"] {
            assert_eq!(apply_rule(word, &rule), word);
        }
    }

    #[test]
    fn zero_member_renders_as_nothing() {
        let mut cats = CategoryTable::new();
        cats.define("A".to_string(), vec!["p".into(), "t".into()]);
        cats.define("Z".to_string(), vec!["0".into(), "s".into()]);
        // p is index 0, and Z[0] is the zero sentinel: p deletes, t > s.
        let rule = single("{0:A} > {0:Z}", &cats);
        assert_eq!(apply_rule("apata", &rule), "aasa");
    }

    #[test]
    fn alternation_commits_to_first_matching() {
        let cats = cats();
        let no_match = single("z > y", &cats);
        let first = single("a > e", &cats);
        let second = single("a > o", &cats);
        assert_eq!(apply_alternation("a", &[no_match, first, second]), "e");
    }

    #[test]
    fn alternation_without_matches_is_identity() {
        let cats = cats();
        let a = single("z > y", &cats);
        let b = single("q > w", &cats);
        assert_eq!(apply_alternation("apak", &[a, b]), "apak");
    }

    #[test]
    fn empty_rule_list_is_identity_with_empty_trace() {
        let lines: Vec<String> = Vec::new();
        let (word, trace) = apply_rule_list("apak", &lines).unwrap();
        assert_eq!(word, "apak");
        assert_eq!(trace, "");
    }

    #[test]
    fn rule_list_threads_categories_and_trace() {
        let lines = ["V = a e i o u", "a > e / _k", "e > i / p_"];
        let (word, trace) = apply_rule_list("apak", &lines).unwrap();
        assert_eq!(word, "apik");
        let expected = "V = a e i o u\na > e / _k apek\ne > i / p_ apik";
        assert_eq!(trace, expected);
    }

    #[test]
    fn categories_defined_mid_list_apply_to_later_lines() {
        let lines = ["{P} > x", "P = p t k", "{P} > x"];
        // The first line sees no P category, stays literal, and cannot match.
        let (word, _) = apply_rule_list("apak", &lines).unwrap();
        assert_eq!(word, "axax");
    }

    #[test]
    fn malformed_line_aborts_with_the_line() {
        let lines = ["V = a e", "garbage"];
        let err = apply_rule_list("apak", &lines).unwrap_err();
        assert!(matches!(err, Error::MalformedRule(line) if line == "garbage"));
    }
}
