//! Per-case reports and the run summary.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::HarnessError;
use crate::harness::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
    /// Hard failure: broken fixture or harness environment.
    Errored,
}

/// Result of running a single case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub path: PathBuf,
    pub status: CaseStatus,
    /// Skip reason, mismatch, or hard error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub expected: Option<String>,
    #[serde(skip)]
    pub actual: Option<String>,
    pub duration_ms: f64,
}

impl CaseReport {
    pub fn new(
        name: String,
        path: PathBuf,
        outcome: Result<Outcome, HarnessError>,
        elapsed: Duration,
    ) -> Self {
        let mut report = Self {
            name,
            path,
            status: CaseStatus::Passed,
            detail: None,
            expected: None,
            actual: None,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        };
        match outcome {
            Ok(Outcome::Passed) => {}
            Ok(Outcome::Skipped(reason)) => {
                report.status = CaseStatus::Skipped;
                report.detail = Some(reason.to_string());
            }
            Ok(Outcome::Failed(mismatch)) => {
                report.status = CaseStatus::Failed;
                report.detail = Some(mismatch.to_string());
                report.expected = Some(mismatch.expected);
                report.actual = Some(mismatch.actual);
            }
            Err(e) => {
                report.status = CaseStatus::Errored;
                report.detail = Some(e.to_string());
            }
        }
        report
    }
}

/// Aggregate counts for a run. Skips are never counted as pass or fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: CaseStatus) {
        match status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed => self.failed += 1,
            CaseStatus::Skipped => self.skipped += 1,
            CaseStatus::Errored => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errored
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.errored > 0
    }
}

impl<'a> FromIterator<&'a CaseReport> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a CaseReport>>(iter: I) -> Self {
        let mut summary = RunSummary::default();
        for report in iter {
            summary.record(report.status);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::SkipReason;
    use crate::verify::{Mismatch, MismatchKind};

    fn report(outcome: Result<Outcome, HarnessError>) -> CaseReport {
        CaseReport::new("t".into(), PathBuf::from("t.data"), outcome, Duration::from_millis(2))
    }

    #[test]
    fn test_report_statuses() {
        assert_eq!(report(Ok(Outcome::Passed)).status, CaseStatus::Passed);

        let skipped = report(Ok(Outcome::Skipped(SkipReason::NoProgram)));
        assert_eq!(skipped.status, CaseStatus::Skipped);
        assert_eq!(skipped.detail.as_deref(), Some("no asm or raw section in datafile"));

        let failed = report(Ok(Outcome::Failed(Mismatch {
            kind: MismatchKind::Stderr,
            expected: "want".into(),
            actual: "got".into(),
        })));
        assert_eq!(failed.status, CaseStatus::Failed);
        assert_eq!(failed.expected.as_deref(), Some("want"));
        assert_eq!(failed.actual.as_deref(), Some("got"));

        let errored = report(Err(HarnessError::NotBuildable));
        assert_eq!(errored.status, CaseStatus::Errored);
    }

    #[test]
    fn test_summary_keeps_skips_separate() {
        let reports = vec![
            report(Ok(Outcome::Passed)),
            report(Ok(Outcome::Skipped(SkipReason::GenericError))),
            report(Ok(Outcome::Skipped(SkipReason::NoExpectation))),
        ];
        let summary: RunSummary = reports.iter().collect();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total(), 3);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_summary_errors_count_as_failures() {
        let mut summary = RunSummary::default();
        summary.record(CaseStatus::Errored);
        assert!(summary.has_failures());
        assert_eq!(summary.failed, 0);
    }
}
