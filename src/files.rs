//! The file-loading collaborator boundary.
//!
//! The engine never touches the filesystem directly: chain application asks
//! a [`RuleFileSource`] for each step's rule lines and modification time.
//! [`DirSource`] is the real filesystem implementation; [`CachedSource`]
//! wraps any source with an mtime-validated line cache so repeated chain
//! applications do not re-read unchanged files.

use crate::cache::ModifiedCache;
use crate::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// Supplies rule-file text and freshness information for chain steps.
///
/// A step identifier is a fully-qualified dotted language path, e.g.
/// `proto.west.coastal`.
pub trait RuleFileSource {
    /// The rule lines of a step's file, with blank lines and `//` comments
    /// already dropped.
    fn load(&self, step: &str) -> Result<Vec<String>, Error>;

    /// The file's last modification time.
    fn modified(&self, step: &str) -> Result<SystemTime, Error>;
}

/// Rule files in a directory, one file per chain step, named by the step's
/// dotted path.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    fn path_for(&self, step: &str) -> PathBuf {
        self.root.join(step)
    }
}

impl RuleFileSource for DirSource {
    fn load(&self, step: &str) -> Result<Vec<String>, Error> {
        let text = fs::read_to_string(self.path_for(step))
            .map_err(|source| Error::FileLoad { file: step.to_string(), source })?;
        Ok(text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty() && !line.starts_with("//"))
            .map(str::to_string)
            .collect())
    }

    fn modified(&self, step: &str) -> Result<SystemTime, Error> {
        fs::metadata(self.path_for(step))
            .and_then(|meta| meta.modified())
            .map_err(|source| Error::FileStat { file: step.to_string(), source })
    }
}

/// A source that caches loaded lines until the underlying file changes.
pub struct CachedSource<S> {
    inner: S,
    lines: ModifiedCache<String, Vec<String>>,
}

impl<S: RuleFileSource> CachedSource<S> {
    /// An unbounded file-line cache over `inner`.
    pub fn new(inner: S) -> Self {
        CachedSource { inner, lines: ModifiedCache::new() }
    }

    /// A cache evicting oldest-first beyond `max_entries` files.
    pub fn bounded(inner: S, max_entries: usize) -> Self {
        CachedSource { inner, lines: ModifiedCache::bounded(max_entries) }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RuleFileSource> RuleFileSource for CachedSource<S> {
    fn load(&self, step: &str) -> Result<Vec<String>, Error> {
        self.lines.get_or_compute(
            step.to_string(),
            || self.inner.modified(step),
            || self.inner.load(step),
        )
    }

    fn modified(&self, step: &str) -> Result<SystemTime, Error> {
        self.inner.modified(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    fn write_file(dir: &std::path::Path, name: &str, text: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn dir_source_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.b", "// vowel shifts\nV = a e i\n\na > e / _k\n");
        let source = DirSource::new(dir.path());
        assert_eq!(source.load("a.b").unwrap(), vec!["V = a e i", "a > e / _k"]);
    }

    #[test]
    fn dir_source_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        let err = source.load("no.such.stage").unwrap_err();
        assert!(matches!(err, Error::FileLoad { file, .. } if file == "no.such.stage"));
        assert!(matches!(source.modified("no.such.stage").unwrap_err(), Error::FileStat { .. }));
    }

    #[test]
    fn dir_source_modified_tracks_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.b", "a > e\n");
        let source = DirSource::new(dir.path());
        assert!(source.modified("a.b").is_ok());
    }

    /// Fake source that counts loads and serves a fixed mtime.
    struct Counting {
        loads: Mutex<usize>,
        mtime: Mutex<SystemTime>,
    }

    impl Counting {
        fn new() -> Self {
            Counting { loads: Mutex::new(0), mtime: Mutex::new(SystemTime::UNIX_EPOCH) }
        }

        fn touch(&self) {
            *self.mtime.lock().unwrap() = SystemTime::now() + std::time::Duration::from_secs(3600);
        }

        fn loads(&self) -> usize {
            *self.loads.lock().unwrap()
        }
    }

    impl RuleFileSource for Counting {
        fn load(&self, _step: &str) -> Result<Vec<String>, Error> {
            *self.loads.lock().unwrap() += 1;
            Ok(vec!["a > e".to_string()])
        }

        fn modified(&self, _step: &str) -> Result<SystemTime, Error> {
            Ok(*self.mtime.lock().unwrap())
        }
    }

    #[test]
    fn cached_source_loads_once_until_modified() {
        let source = CachedSource::new(Counting::new());
        source.load("a.b").unwrap();
        source.load("a.b").unwrap();
        assert_eq!(source.inner.loads(), 1);

        source.inner.touch();
        source.load("a.b").unwrap();
        assert_eq!(source.inner.loads(), 2);
    }
}
