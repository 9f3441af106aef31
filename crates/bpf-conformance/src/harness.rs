//! The verification unit: gate, build, provision, run, check.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fixture::{DataFileLoader, Fixture, FixtureLoader};
use crate::memory::MemoryImage;
use crate::program::{build_program, Assembler, CommandAssembler};
use crate::runner::VmRunner;
use crate::verify::{Expectation, Mismatch};

/// Why a fixture was not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoProgram,
    NoExpectation,
    GenericError,
    VmNotFound(PathBuf),
    NoAssembler,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoProgram => write!(f, "no asm or raw section in datafile"),
            SkipReason::NoExpectation => {
                write!(f, "no result or verifier error section in datafile")
            }
            SkipReason::GenericError => write!(f, "non-verifier error section in datafile"),
            SkipReason::VmNotFound(path) => write!(f, "VM not found at {}", path.display()),
            SkipReason::NoAssembler => write!(f, "asm section but no assembler configured"),
        }
    }
}

/// Result of a verification unit that did not hit a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(Mismatch),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

/// Verifies fixtures against one VM executable.
pub struct Harness {
    runner: VmRunner,
    loader: Box<dyn FixtureLoader>,
    assembler: Option<Box<dyn Assembler>>,
}

impl Harness {
    pub fn new(runner: VmRunner) -> Self {
        Self {
            runner,
            loader: Box::new(DataFileLoader),
            assembler: None,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        let runner = VmRunner::new(&config.vm.path).with_verbose_flag(&config.vm.verbose_flag);
        let harness = Self::new(runner);
        match config
            .assembler
            .as_ref()
            .and_then(|a| CommandAssembler::from_argv(&a.command))
        {
            Some(assembler) => harness.with_assembler(assembler),
            None => harness,
        }
    }

    pub fn with_loader(mut self, loader: impl FixtureLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_assembler(mut self, assembler: impl Assembler + 'static) -> Self {
        self.assembler = Some(Box::new(assembler));
        self
    }

    /// Decide whether a fixture is outside this harness's responsibility.
    pub fn gate(&self, fixture: &Fixture) -> Option<SkipReason> {
        if !fixture.has_program() {
            return Some(SkipReason::NoProgram);
        }
        if !fixture.has_result() && fixture.verifier_error().is_none() {
            return Some(SkipReason::NoExpectation);
        }
        if fixture.has_generic_error() {
            return Some(SkipReason::GenericError);
        }
        if !self.runner.is_available() {
            return Some(SkipReason::VmNotFound(self.runner.vm().to_path_buf()));
        }
        if fixture.raw().is_none() && self.assembler.is_none() {
            return Some(SkipReason::NoAssembler);
        }
        None
    }

    /// Load and verify one fixture file.
    pub fn verify_file(&self, path: &Path) -> Result<Outcome, HarnessError> {
        let fixture = self
            .loader
            .load(path)
            .map_err(|source| HarnessError::Fixture {
                path: path.to_path_buf(),
                source,
            })?;
        self.verify(&fixture)
    }

    /// Verify an already-loaded fixture.
    pub fn verify(&self, fixture: &Fixture) -> Result<Outcome, HarnessError> {
        if let Some(reason) = self.gate(fixture) {
            log::info!("skip: {}", reason);
            return Ok(Outcome::Skipped(reason));
        }
        let Some(expectation) = Expectation::classify(fixture) else {
            return Ok(Outcome::Skipped(SkipReason::NoExpectation));
        };

        let program = build_program(fixture, self.assembler.as_deref())?;
        let memory = MemoryImage::provision(fixture.mem())?;
        let result = self
            .runner
            .run(&program, memory.as_ref().map(MemoryImage::path))?;
        drop(memory);

        Ok(match expectation.check(&result) {
            Ok(()) => Outcome::Passed,
            Err(mismatch) => Outcome::Failed(mismatch),
        })
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("runner", &self.runner)
            .field("assembler", &self.assembler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{sections, FixtureError, Section};
    use std::collections::HashMap;

    /// Serves fixtures from memory instead of the filesystem.
    struct InMemoryLoader(HashMap<PathBuf, Fixture>);

    impl FixtureLoader for InMemoryLoader {
        fn load(&self, path: &Path) -> Result<Fixture, FixtureError> {
            self.0.get(path).cloned().ok_or_else(|| {
                FixtureError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such in-memory fixture",
                ))
            })
        }
    }

    fn missing_vm() -> Harness {
        Harness::new(VmRunner::new("/nonexistent/bpf/vm"))
    }

    fn raw_exit() -> Fixture {
        Fixture::new().with(sections::RAW, Section::Words(vec![0x95]))
    }

    #[test]
    fn test_gate_no_program() {
        let fixture = Fixture::new().with_text(sections::RESULT, "0x0");
        assert_eq!(missing_vm().gate(&fixture), Some(SkipReason::NoProgram));
    }

    #[test]
    fn test_gate_no_expectation() {
        assert_eq!(missing_vm().gate(&raw_exit()), Some(SkipReason::NoExpectation));
    }

    #[test]
    fn test_gate_generic_error_wins_over_result() {
        let fixture = raw_exit()
            .with_text(sections::RESULT, "0x0")
            .with_text(sections::ERROR_PATTERN, "division by zero");
        assert_eq!(missing_vm().gate(&fixture), Some(SkipReason::GenericError));

        let fixture = raw_exit()
            .with_text(sections::VERIFIER_ERROR, "bad")
            .with_text(sections::ERROR, "bad");
        assert_eq!(missing_vm().gate(&fixture), Some(SkipReason::GenericError));
    }

    #[test]
    fn test_gate_missing_vm() {
        let fixture = raw_exit().with_text(sections::RESULT, "0x0");
        assert_eq!(
            missing_vm().gate(&fixture),
            Some(SkipReason::VmNotFound(PathBuf::from("/nonexistent/bpf/vm")))
        );
        assert_eq!(
            missing_vm().verify(&fixture).unwrap(),
            Outcome::Skipped(SkipReason::VmNotFound(PathBuf::from("/nonexistent/bpf/vm")))
        );
    }

    #[test]
    fn test_gate_asm_without_assembler() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(VmRunner::new(dir.path()));
        let fixture = Fixture::new()
            .with_text(sections::ASM, "exit")
            .with_text(sections::RESULT, "0x0");
        assert_eq!(harness.gate(&fixture), Some(SkipReason::NoAssembler));
        assert_eq!(harness.gate(&raw_exit().with_text(sections::RESULT, "0x0")), None);
    }

    #[test]
    fn test_verify_file_propagates_malformed_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.data");
        std::fs::write(&path, "-- raw\nnot-a-number\n-- result\n0x0\n").unwrap();
        assert!(matches!(
            missing_vm().verify_file(&path),
            Err(HarnessError::Fixture { .. })
        ));
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(Outcome::Passed.is_passed());
        assert!(Outcome::Skipped(SkipReason::NoProgram).is_skipped());
        assert!(!Outcome::Skipped(SkipReason::NoProgram).is_passed());
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_file_uses_bound_loader() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let vm = dir.path().join("vm.sh");
        std::fs::write(&vm, "#!/bin/sh\ncat >/dev/null\nexit 0\n").unwrap();
        std::fs::set_permissions(&vm, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut fixtures = HashMap::new();
        fixtures.insert(
            PathBuf::from("mem/exit"),
            raw_exit().with_text(sections::RESULT, "0x0"),
        );
        fixtures.insert(
            PathBuf::from("mem/no-program"),
            Fixture::new().with_text(sections::RESULT, "0x0"),
        );
        let harness = Harness::new(VmRunner::new(&vm)).with_loader(InMemoryLoader(fixtures));

        assert_eq!(harness.verify_file(Path::new("mem/exit")).unwrap(), Outcome::Passed);
        assert_eq!(
            harness.verify_file(Path::new("mem/no-program")).unwrap(),
            Outcome::Skipped(SkipReason::NoProgram)
        );
        match harness.verify_file(Path::new("mem/missing")) {
            Err(HarnessError::Fixture { path, source }) => {
                assert_eq!(path, PathBuf::from("mem/missing"));
                assert!(matches!(source, FixtureError::Io(_)));
            }
            other => panic!("expected fixture error, got {:?}", other),
        }
    }
}
