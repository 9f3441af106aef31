//! Outcome verifier: compares a captured VM run against the fixture's
//! declared expectation.

use std::fmt;

use crate::fixture::Fixture;
use crate::runner::ProcessResult;

/// Appended by the VM to every verifier diagnostic.
pub const VERIFICATION_SUFFIX: &str = "\nFailed verification";

/// What a fixture says the VM should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Static rejection with this exact diagnostic.
    VerifierError(String),
    /// Some failure; only the exit status is checked.
    Error,
    /// Clean exit.
    Success,
}

impl Expectation {
    /// Classify in priority order: verifier error, generic error, success.
    ///
    /// `None` when the fixture declares no expectation at all.
    pub fn classify(fixture: &Fixture) -> Option<Self> {
        if let Some(message) = fixture.verifier_error() {
            Some(Expectation::VerifierError(message.to_string()))
        } else if fixture.has_generic_error() {
            Some(Expectation::Error)
        } else if fixture.has_result() {
            Some(Expectation::Success)
        } else {
            None
        }
    }

    /// Check a run against this expectation.
    pub fn check(&self, result: &ProcessResult) -> Result<(), Mismatch> {
        match self {
            Expectation::VerifierError(message) => {
                let expected = format!("{}{}", message, VERIFICATION_SUFFIX);
                if result.stderr != expected {
                    return Err(Mismatch {
                        kind: MismatchKind::Stderr,
                        expected,
                        actual: result.stderr.clone(),
                    });
                }
                expect_nonzero(result)
            }
            Expectation::Error => expect_nonzero(result),
            Expectation::Success => {
                if result.exit_status != 0 {
                    return Err(Mismatch {
                        kind: MismatchKind::ExitStatus,
                        expected: "exit status 0".to_string(),
                        actual: format!(
                            "exit status {}, stderr={:?}",
                            result.exit_status, result.stderr
                        ),
                    });
                }
                Ok(())
            }
        }
    }
}

fn expect_nonzero(result: &ProcessResult) -> Result<(), Mismatch> {
    if result.exit_status == 0 {
        return Err(Mismatch {
            kind: MismatchKind::ExitStatus,
            expected: "non-zero exit status".to_string(),
            actual: "exit status 0".to_string(),
        });
    }
    Ok(())
}

/// Which part of the run diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    Stderr,
    ExitStatus,
}

/// Assertion failure: the VM did not behave as the fixture declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::Stderr => {
                write!(f, "Expected error {:?}, got {:?}", self.expected, self.actual)
            }
            MismatchKind::ExitStatus => {
                write!(f, "Expected {}, got {}", self.expected, self.actual)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sections;

    fn run(exit_status: i32, stderr: &str) -> ProcessResult {
        ProcessResult {
            exit_status,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_classify_priority() {
        let both = Fixture::new()
            .with_text(sections::VERIFIER_ERROR, "invalid instruction")
            .with_text(sections::ERROR, "boom")
            .with_text(sections::RESULT, "0x0");
        assert_eq!(
            Expectation::classify(&both),
            Some(Expectation::VerifierError("invalid instruction".into()))
        );

        let generic = Fixture::new()
            .with_text(sections::ERROR_PATTERN, "oob")
            .with_text(sections::RESULT, "0x0");
        assert_eq!(Expectation::classify(&generic), Some(Expectation::Error));

        let success = Fixture::new().with_text(sections::RESULT, "0x0");
        assert_eq!(Expectation::classify(&success), Some(Expectation::Success));

        assert_eq!(Expectation::classify(&Fixture::new()), None);
    }

    #[test]
    fn test_verifier_error_exact_match_passes() {
        let exp = Expectation::VerifierError("invalid instruction".into());
        assert!(exp.check(&run(1, "invalid instruction\nFailed verification")).is_ok());
        assert!(exp.check(&run(255, "invalid instruction\nFailed verification")).is_ok());
    }

    #[test]
    fn test_verifier_error_substring_does_not_match() {
        let exp = Expectation::VerifierError("invalid instruction".into());
        let err = exp
            .check(&run(1, "error: invalid instruction\nFailed verification"))
            .unwrap_err();
        assert_eq!(err.kind, MismatchKind::Stderr);
        assert_eq!(err.expected, "invalid instruction\nFailed verification");
        assert_eq!(err.actual, "error: invalid instruction\nFailed verification");

        assert!(exp.check(&run(1, "invalid instruction")).is_err());
    }

    #[test]
    fn test_verifier_error_requires_nonzero_exit() {
        let exp = Expectation::VerifierError("invalid instruction".into());
        let err = exp
            .check(&run(0, "invalid instruction\nFailed verification"))
            .unwrap_err();
        assert_eq!(err.kind, MismatchKind::ExitStatus);
    }

    #[test]
    fn test_generic_error_checks_exit_only() {
        assert!(Expectation::Error.check(&run(2, "anything at all")).is_ok());
        assert!(Expectation::Error.check(&run(0, "")).is_err());
    }

    #[test]
    fn test_success_ignores_output() {
        let mut result = run(0, "noise");
        result.stdout = "0x2a\n".into();
        assert!(Expectation::Success.check(&result).is_ok());

        let err = Expectation::Success.check(&run(1, "crash")).unwrap_err();
        assert_eq!(err.kind, MismatchKind::ExitStatus);
        assert!(err.actual.contains("exit status 1"));
        assert!(err.actual.contains("crash"));
    }

    #[test]
    fn test_mismatch_display_reports_both_values() {
        let m = Mismatch {
            kind: MismatchKind::Stderr,
            expected: "a".into(),
            actual: "b".into(),
        };
        assert_eq!(m.to_string(), "Expected error \"a\", got \"b\"");
    }
}
