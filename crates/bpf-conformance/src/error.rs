//! Harness error types.
//!
//! These are *hard* failures: the fixture or the harness environment is
//! broken. A VM that misbehaves is reported through
//! [`Outcome::Failed`](crate::Outcome::Failed), never through this type.

use std::path::PathBuf;

use crate::fixture::FixtureError;

/// Errors that abort a single verification unit.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Fixture could not be loaded
    #[error("{}: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: FixtureError,
    },

    /// Fixture has neither `asm` nor `raw`
    #[error("Fixture has no program section")]
    NotBuildable,

    /// External assembler rejected the source or could not be run
    #[error("Assembler error: {0}")]
    Assemble(String),

    /// Temporary memory image could not be created
    #[error("Memory image error: {0}")]
    MemoryImage(#[source] std::io::Error),

    /// VM process could not be started
    #[error("Failed to spawn {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Talking to the running VM failed
    #[error("VM I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// VM wrote something that is not UTF-8
    #[error("VM {stream} is not valid UTF-8")]
    Decode { stream: &'static str },

    /// Corpus glob pattern is invalid
    #[error("Invalid corpus pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A corpus entry could not be read while listing fixtures
    #[error("Failed to list corpus: {0}")]
    Glob(#[from] glob::GlobError),
}
