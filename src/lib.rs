#[macro_use]
mod macros;
mod api;
mod cache;
mod engine;
mod error;
mod files;

pub use api::{Applied, ChainPair, SoundChangeCache, apply_chain, apply_word, expand_chain};
pub use cache::ModifiedCache;
pub use error::Error;
pub use files::{CachedSource, DirSource, RuleFileSource};

use std::collections::{BTreeMap, HashMap};

// --- Internal types ---------------------------------------------------------

/// Named categories of interchangeable graphemes, e.g. `V = a e i o u`.
///
/// Members keep their definition order: the *index* of a member is what
/// numbered category references unify on, and what output templates resolve
/// to. The member `"0"` is the zero sentinel: it matches a literal `0` in a
/// word and renders as the empty string on output, which allows categories
/// with gaps.
///
/// A table lives for exactly one rule-list application. It is seeded empty at
/// the start of each top-level call and mutated only by category-definition
/// lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct CategoryTable {
    cats: HashMap<String, Vec<String>>,
}

impl CategoryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        CategoryTable { cats: HashMap::new() }
    }

    /// Define (or redefine) a category.
    pub fn define(&mut self, name: String, members: Vec<String>) {
        self.cats.insert(name, members);
    }

    /// Get the ordered members of a category, if defined.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.cats.get(name).map(Vec::as_slice)
    }

    /// Expand `{name}` tokens in a category-definition body to the
    /// space-joined members of already-defined categories.
    ///
    /// This is what makes category composition work:
    ///
    /// ```text
    /// stop  = p t k
    /// nasal = m n
    /// C     = {stop} {nasal} s
    /// ```
    pub fn expand_members(&self, body: &str) -> String {
        let mut out = body.to_string();
        for (name, members) in &self.cats {
            let token = format!("{{{name}}}");
            if out.contains(&token) {
                out = out.replace(&token, &members.join(" "));
            }
        }
        out
    }
}

/// One compiled line of rule syntax.
#[derive(Debug, Clone)]
pub(crate) enum RuleLine {
    /// `name = member1 member2 ...` — updates the category table.
    Category { name: String, members: Vec<String> },
    /// `from > to [/ before_after] [! unbefore_unafter]`
    Single(Rule),
    /// `rule1 | rule2 | ...` — the first alternative with a match is applied.
    Alternation(Vec<Rule>),
}

/// A compiled sound change rule.
///
/// `from` is matched in the word, subject to the optional contexts; matched
/// spans are replaced by the rendered `to` template. Absent contexts are
/// `None`, never empty sentinels.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    /// The source line, kept for traces and diagnostics.
    pub text: String,
    pub from: Pattern,
    pub to: Template,
    /// Must match immediately before the site.
    pub before: Option<Pattern>,
    /// Must match immediately after the site.
    pub after: Option<Pattern>,
    /// Must *not* match immediately before the site.
    pub unbefore: Option<Pattern>,
    /// Must *not* match immediately after the site.
    pub unafter: Option<Pattern>,
}

/// A matcher expression: a sequence of elements matched in order.
pub(crate) type Pattern = Vec<PatternElem>;

/// Which edge of a word the boundary marker `#` asserts.
///
/// The marker compiles per field: left edge in `before`/`unbefore`, right
/// edge in `after`/`unafter`, either edge in `from`. "Edge" means start/end
/// of the string or adjacency to whitespace, so multi-word strings get a
/// boundary at every space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryKind {
    Start,
    End,
    Either,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PatternElem {
    /// Verbatim text. Unknown category references degrade to this.
    Literal(String),
    /// Zero-width word-boundary assertion.
    Boundary(BoundaryKind),
    /// A category reference `{name}` or `{n:name}`.
    ///
    /// Members are embedded at compile time as `(definition_index, text)`
    /// pairs, sorted longest-first so multigraphs win over their prefixes.
    /// `slot` is present for numbered references and tags the capture for
    /// unification.
    Category {
        slot: Option<u8>,
        members: Vec<(usize, String)>,
    },
}

/// An output template: literal text interspersed with category slots.
pub(crate) type Template = Vec<TemplateElem>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateElem {
    Literal(String),
    /// `{n:name}` in an output — resolves to the member at the index bound to
    /// slot `n` during matching. `raw` is the original token text, emitted
    /// verbatim when the slot ended up unbound (fail-soft).
    Slot { slot: u8, members: Vec<String>, raw: String },
}

/// An accepted match: a byte span in the word plus the slot bindings that
/// survived unification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchSite {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive). Equal to `start` for zero-width matches
    /// (insertion rules).
    pub end: usize,
    /// Slot index -> category member index.
    pub bindings: BTreeMap<u8, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_table_defines_and_gets() {
        let mut cats = CategoryTable::new();
        cats.define("V".to_string(), vec!["a".into(), "e".into(), "i".into()]);
        assert_eq!(cats.get("V"), Some(["a".to_string(), "e".into(), "i".into()].as_slice()));
        assert_eq!(cats.get("C"), None);
    }

    #[test]
    fn expand_members_composes_categories() {
        let mut cats = CategoryTable::new();
        cats.define("stop".to_string(), vec!["p".into(), "t".into(), "k".into()]);
        cats.define("nasal".to_string(), vec!["m".into(), "n".into()]);
        assert_eq!(cats.expand_members("{stop} {nasal} s"), "p t k m n s");
    }

    #[test]
    fn expand_members_leaves_unknown_references() {
        let cats = CategoryTable::new();
        assert_eq!(cats.expand_members("{mystery} x"), "{mystery} x");
    }
}
