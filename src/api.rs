use crate::cache::ModifiedCache;
use crate::engine;
use crate::error::Error;
use crate::files::{CachedSource, RuleFileSource};
use std::time::{Duration, Instant, SystemTime};

/// Result of applying rules to a word.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The transformed word.
    pub word: String,
    /// Debug trace at the requested level; empty when nothing was traced.
    pub trace: String,
    /// Total elapsed time spent compiling and applying.
    pub elapsed: Duration,
}

/// One (start, end) pair of positions in the language derivation tree.
///
/// `end` either descends from `start` (`"a"` to `"a.b.c"`) or is written
/// relative with a leading dot (`".b.c"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainPair {
    pub start: String,
    pub end: String,
}

impl ChainPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        ChainPair { start: start.into(), end: end.into() }
    }
}

/// Apply an in-memory list of rule lines to a word.
///
/// Lines are applied in order with a fresh category table; the trace records
/// every line, with the word's state after each rule (debug level 2 of
/// [`apply_chain`], always on here since the caller already has the lines in
/// hand).
///
/// # Example
/// ```
/// use soundlaw::apply_word;
///
/// let lines = ["V = a e i o u", "a > e / _k"];
/// let out = apply_word("apak", &lines).unwrap();
/// assert_eq!(out.word, "apek");
/// ```
pub fn apply_word<S: AsRef<str>>(word: &str, lines: &[S]) -> Result<Applied, Error> {
    let started = Instant::now();
    let (word, trace) = engine::apply_rule_list(word, lines)?;
    Ok(Applied { word, trace, elapsed: started.elapsed() })
}

/// Expand chain pairs into the ordered list of rule-file identifiers,
/// without applying anything.
pub fn expand_chain(pairs: &[ChainPair]) -> Result<Vec<String>, Error> {
    engine::expand_pairs(pairs)
}

/// Apply a chain of rule files to a word.
///
/// The pairs expand to an ordered list of file steps; each step's lines are
/// loaded from `source` and applied in order, with a fresh category table
/// per file.
///
/// Debug levels: `0` — no trace; `1` — the word after each file; `2` — the
/// full per-rule trace of every file as well. Any trace starts with the
/// first pair's start path and the untransformed word.
pub fn apply_chain(
    word: &str,
    pairs: &[ChainPair],
    debug: u8,
    source: &dyn RuleFileSource,
) -> Result<Applied, Error> {
    let started = Instant::now();
    let steps = engine::expand_pairs(pairs)?;

    let mut trace: Vec<String> = Vec::new();
    if debug > 0 && !steps.is_empty() {
        trace.push(format!("{}: {}", pairs[0].start, word));
    }

    let mut current = word.to_string();
    for step in &steps {
        let lines = source.load(step)?;
        let (next, file_trace) = engine::apply_rule_list(&current, &lines)?;
        current = next;
        if debug > 1 {
            trace.push(file_trace);
        }
        if debug > 0 {
            trace.push(format!("{step}: {current}"));
        }
    }

    Ok(Applied { word: current, trace: trace.join("\n"), elapsed: started.elapsed() })
}

/// A memoizing front for [`apply_chain`], keyed on `(word, pairs)` and
/// invalidated by the modification time of any file in the chain.
///
/// Rule-file text is cached as well (through a [`CachedSource`]), so a cache
/// miss on one word does not re-read files another word already loaded.
pub struct SoundChangeCache<S> {
    source: CachedSource<S>,
    results: ModifiedCache<(String, Vec<ChainPair>), String>,
}

impl<S: RuleFileSource> SoundChangeCache<S> {
    /// An unbounded cache over `source`.
    pub fn new(source: S) -> Self {
        SoundChangeCache { source: CachedSource::new(source), results: ModifiedCache::new() }
    }

    /// Bound the result cache and the file cache separately; `None` means
    /// unbounded.
    pub fn with_bounds(source: S, max_results: Option<usize>, max_files: Option<usize>) -> Self {
        let source = match max_files {
            Some(max) => CachedSource::bounded(source, max),
            None => CachedSource::new(source),
        };
        let results = match max_results {
            Some(max) => ModifiedCache::bounded(max),
            None => ModifiedCache::new(),
        };
        SoundChangeCache { source, results }
    }

    /// Apply `pairs` to `word`, reusing the cached result while every file
    /// in the chain is unchanged.
    pub fn apply(&self, word: &str, pairs: &[ChainPair]) -> Result<String, Error> {
        let key = (word.to_string(), pairs.to_vec());
        self.results.get_or_compute(
            key,
            || latest_modified(&self.source, pairs),
            || apply_chain(word, pairs, 0, &self.source).map(|applied| applied.word),
        )
    }

    /// Drop all cached results (loaded file text stays cached).
    pub fn purge(&self) {
        self.results.purge();
    }
}

/// The latest modification time of any file referenced by `pairs`.
fn latest_modified(source: &dyn RuleFileSource, pairs: &[ChainPair]) -> Result<SystemTime, Error> {
    let mut latest = SystemTime::UNIX_EPOCH;
    for step in engine::expand_pairs(pairs)? {
        latest = latest.max(source.modified(&step)?);
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    #[test]
    fn apply_word_end_to_end() {
        let lines = ["V = a e i o u", "a > e / _k"];
        let out = apply_word("apak", &lines).unwrap();
        assert_eq!(out.word, "apek");
        assert_eq!(out.trace, "V = a e i o u\na > e / _k apek");
        assert!(out.elapsed >= Duration::ZERO);
    }

    #[test]
    fn apply_word_empty_lines_is_identity() {
        let out = apply_word("apak", &Vec::<String>::new()).unwrap();
        assert_eq!(out.word, "apak");
        assert_eq!(out.trace, "");
    }

    #[test]
    fn apply_word_surfaces_malformed_lines() {
        let err = apply_word("apak", &["not a rule"]).unwrap_err();
        assert!(matches!(err, Error::MalformedRule(_)));
    }

    fn chain_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.b"), "// lenition\np > b / a_a\n").unwrap();
        fs::write(dir.path().join("a.b.c"), "b > w / a_a\na > o / _#\n").unwrap();
        dir
    }

    #[test]
    fn apply_chain_walks_the_lineage() {
        let dir = chain_dir();
        let source = crate::DirSource::new(dir.path());
        let pairs = [ChainPair::new("a", "a.b.c")];
        let out = apply_chain("apa", &pairs, 0, &source).unwrap();
        assert_eq!(out.word, "awo");
        assert_eq!(out.trace, "");
    }

    #[test]
    fn apply_chain_debug_one_traces_per_file() {
        let dir = chain_dir();
        let source = crate::DirSource::new(dir.path());
        let pairs = [ChainPair::new("a", "a.b.c")];
        let out = apply_chain("apa", &pairs, 1, &source).unwrap();
        assert_eq!(out.trace, "a: apa\na.b: aba\na.b.c: awo");
    }

    #[test]
    fn apply_chain_debug_two_traces_per_rule() {
        let dir = chain_dir();
        let source = crate::DirSource::new(dir.path());
        let pairs = [ChainPair::new("a", "a.b.c")];
        let out = apply_chain("apa", &pairs, 2, &source).unwrap();
        let expected = "a: apa\n\
                        p > b / a_a aba\n\
                        a.b: aba\n\
                        b > w / a_a awa\na > o / _# awo\n\
                        a.b.c: awo";
        assert_eq!(out.trace, expected);
    }

    #[test]
    fn apply_chain_missing_file_is_a_hard_stop() {
        let dir = tempfile::tempdir().unwrap();
        let source = crate::DirSource::new(dir.path());
        let pairs = [ChainPair::new("a", "a.b")];
        assert!(matches!(apply_chain("apa", &pairs, 0, &source), Err(Error::FileLoad { .. })));
    }

    /// Source serving fixed lines with a controllable mtime and load count.
    struct Scripted {
        loads: Mutex<usize>,
        mtime: Mutex<SystemTime>,
        lines: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(lines: &[&str]) -> Self {
            Scripted {
                loads: Mutex::new(0),
                mtime: Mutex::new(SystemTime::UNIX_EPOCH),
                lines: Mutex::new(lines.iter().map(|l| l.to_string()).collect()),
            }
        }

        fn rewrite(&self, lines: &[&str]) {
            *self.lines.lock().unwrap() = lines.iter().map(|l| l.to_string()).collect();
            *self.mtime.lock().unwrap() = SystemTime::now() + Duration::from_secs(3600);
        }

        fn loads(&self) -> usize {
            *self.loads.lock().unwrap()
        }
    }

    impl RuleFileSource for Scripted {
        fn load(&self, _step: &str) -> Result<Vec<String>, Error> {
            *self.loads.lock().unwrap() += 1;
            Ok(self.lines.lock().unwrap().clone())
        }

        fn modified(&self, _step: &str) -> Result<SystemTime, Error> {
            Ok(*self.mtime.lock().unwrap())
        }
    }

    #[test]
    fn cache_reuses_fresh_results() {
        let cache = SoundChangeCache::new(Scripted::new(&["a > e"]));
        let pairs = [ChainPair::new("a", "a.b")];
        assert_eq!(cache.apply("apak", &pairs).unwrap(), "epek");
        assert_eq!(cache.apply("apak", &pairs).unwrap(), "epek");
        assert_eq!(cache.source.inner().loads(), 1);
    }

    #[test]
    fn cache_recomputes_when_a_file_changes() {
        let cache = SoundChangeCache::new(Scripted::new(&["a > e"]));
        let pairs = [ChainPair::new("a", "a.b")];
        assert_eq!(cache.apply("apak", &pairs).unwrap(), "epek");

        cache.source.inner().rewrite(&["a > o"]);
        assert_eq!(cache.apply("apak", &pairs).unwrap(), "opok");
    }

    #[test]
    fn cache_propagates_chain_errors() {
        let cache = SoundChangeCache::new(Scripted::new(&["a > e"]));
        let pairs = [ChainPair::new("a.b", "x.y")];
        assert!(matches!(cache.apply("apak", &pairs), Err(Error::UnrelatedChainPair { .. })));
    }
}
