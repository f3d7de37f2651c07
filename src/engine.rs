//! Rule compilation, matching, and rewriting engine.
//!
//! This module is the entry point for everything between a line of rule
//! syntax and a transformed word. The public API in `src/api.rs` is a thin
//! layer over the functions re-exported here.
//!
//! ## How the parts work together
//!
//! Applying a rule list to a word is a pipeline:
//!
//! ```text
//! lines ── compile_line ──┐            (compiler.rs)
//!   category definitions ─┼─ update CategoryTable
//!   rules / alternations ─┘
//!                         │
//!                         v
//!               find_matches (matcher.rs)
//!                 - structural scan, backtracking over category members
//!                 - slot unification pass; inconsistent sites discarded
//!                         │
//!                         v
//!               apply_rule / apply_alternation (rewrite.rs)
//!                 - splice output templates right-to-left
//!                         │
//!                         v
//!               apply_rule_list -> (word, trace)
//! ```
//!
//! Chain expansion (`chain.rs`) sits in front of this pipeline when the
//! caller supplies (start, end) language-path pairs instead of rule lines:
//! each expanded step names one rule file, loaded by a
//! [`crate::RuleFileSource`] and fed through `apply_rule_list` in order.
//!
//! ## Responsibilities by module
//!
//! - `compiler.rs`: one rule-syntax line -> `RuleLine` (category definition,
//!   rule, or alternation); expands category references into embedded member
//!   alternations and builds output templates.
//! - `matcher.rs`: finds non-overlapping match sites for a compiled rule,
//!   enforcing numbered-category consistency as an explicit second pass.
//! - `rewrite.rs`: applies accepted sites right-to-left, commits to the first
//!   matching alternative, and threads the debug trace through a rule list.
//! - `chain.rs`: expands (start, end) path pairs into the ordered list of
//!   intermediate rule-file identifiers.
//!
//! ## Debugging
//!
//! Set `SOUNDLAW_DEBUG_RULES=1` to print compilation fallbacks and match
//! rejections to stderr.

#[path = "engine/chain.rs"]
mod chain;
#[path = "engine/compiler.rs"]
mod compiler;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/rewrite.rs"]
mod rewrite;

pub(crate) use chain::expand_pairs;
pub(crate) use compiler::compile_line;
pub(crate) use matcher::find_matches;
#[allow(unused_imports)]
pub(crate) use rewrite::{apply_alternation, apply_rule, apply_rule_list};
