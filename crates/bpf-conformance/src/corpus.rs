//! Case enumerator: one case per fixture file in the corpus directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::CorpusConfig;
use crate::error::HarnessError;
use crate::harness::{Harness, Outcome};
use crate::report::CaseReport;

pub const DEFAULT_PATTERN: &str = "*.data";

/// A directory of fixture files.
#[derive(Debug, Clone)]
pub struct Corpus {
    dir: PathBuf,
    pattern: String,
}

impl Corpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(&config.dir).with_pattern(&config.pattern)
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Fixture files, sorted by path.
    ///
    /// An entry that cannot be read while walking the pattern is an error,
    /// not a silently shorter corpus.
    pub fn files(&self) -> Result<Vec<PathBuf>, HarnessError> {
        let full = format!(
            "{}/{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            self.pattern
        );
        let mut files = Vec::new();
        for entry in glob::glob(&full)? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Cases bound to `harness`. Each call re-lists the directory.
    pub fn cases<'h>(&self, harness: &'h Harness) -> Result<Cases<'h>, HarnessError> {
        Ok(Cases::new(self.files()?, harness))
    }
}

/// Iterator over cases; yields nothing but descriptors, runs nothing.
pub struct Cases<'h> {
    paths: std::vec::IntoIter<PathBuf>,
    harness: &'h Harness,
}

impl<'h> Cases<'h> {
    /// Cases for an explicit list of fixture files.
    pub fn new(paths: Vec<PathBuf>, harness: &'h Harness) -> Self {
        Self {
            paths: paths.into_iter(),
            harness,
        }
    }
}

impl<'h> Iterator for Cases<'h> {
    type Item = Case<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        self.paths.next().map(|path| Case {
            path,
            harness: self.harness,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

impl ExactSizeIterator for Cases<'_> {}

/// One fixture paired with the harness that verifies it.
#[derive(Debug, Clone)]
pub struct Case<'h> {
    path: PathBuf,
    harness: &'h Harness,
}

impl Case<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem of the fixture, e.g. `ldxb` for `tests/ldxb.data`.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn run(&self) -> Result<Outcome, HarnessError> {
        self.harness.verify_file(&self.path)
    }

    /// Run and time the case.
    pub fn report(&self) -> CaseReport {
        let start = Instant::now();
        let outcome = self.run();
        CaseReport::new(self.name(), self.path.clone(), outcome, start.elapsed())
    }
}
