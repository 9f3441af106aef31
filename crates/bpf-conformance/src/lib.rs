//! BPF VM conformance harness
//!
//! Drives an external VM executable over a corpus of fixture files. For each
//! fixture the harness builds the program (pre-encoded `raw` words or `asm`
//! text through an external assembler), materialises an optional memory
//! image, runs the VM once with the program on stdin, and checks the exit
//! status and diagnostics against what the fixture declares.
//!
//! Every case ends in one of three ways: [`Outcome`] (passed, failed with a
//! [`Mismatch`], or skipped), or a [`HarnessError`] when the fixture or the
//! environment itself is broken.

pub mod config;
pub mod corpus;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod memory;
pub mod program;
pub mod report;
pub mod runner;
pub mod verify;

pub use config::{ConfigError, HarnessConfig};
pub use corpus::{Case, Cases, Corpus};
pub use error::HarnessError;
pub use fixture::{DataFileLoader, Fixture, FixtureError, FixtureLoader, Section};
pub use harness::{Harness, Outcome, SkipReason};
pub use memory::MemoryImage;
pub use program::{build_program, encode_raw, Assembler, CommandAssembler};
pub use report::{CaseReport, CaseStatus, RunSummary};
pub use runner::{ProcessResult, VmRunner};
pub use verify::{Expectation, Mismatch, MismatchKind};
