//! `bpf-conformance run` — verify fixtures and report.

use crate::output::{self, StyledOutput};
use crate::target::TargetArgs;
use crate::Reporter;
use bpf_conformance::{CaseReport, CaseStatus, Cases, Corpus, Harness, RunSummary};
use std::path::PathBuf;
use std::time::Instant;
use termcolor::Color;

/// Arguments for the run command.
pub struct RunArgs {
    pub target: TargetArgs,
    pub files: Vec<PathBuf>,
    pub filter: Option<String>,
    pub bail: bool,
    pub reporter: Reporter,
    pub color: String,
}

/// Returns `false` if any case failed or errored.
pub fn execute(args: RunArgs) -> anyhow::Result<bool> {
    let config = args.target.resolve()?;
    let harness = Harness::from_config(&config);
    let mut out = StyledOutput::new(output::resolve_color_choice(&args.color));

    let corpus = Corpus::from_config(&config.corpus);
    let cases = if args.files.is_empty() {
        corpus.cases(&harness)?
    } else {
        Cases::new(args.files.clone(), &harness)
    };

    let overall_start = Instant::now();
    let mut reports: Vec<CaseReport> = Vec::new();
    let mut summary = RunSummary::default();

    // One case at a time; each blocks until its VM process exits.
    for case in cases {
        if let Some(ref pattern) = args.filter {
            if !case.name().contains(pattern.as_str()) {
                continue;
            }
        }

        let report = case.report();
        if report.status == CaseStatus::Errored {
            log::warn!("{}: {}", report.path.display(), report.detail.as_deref().unwrap_or(""));
        }
        summary.record(report.status);

        match args.reporter {
            Reporter::Default => print_default_result(&mut out, &report),
            Reporter::Dot => print_dot_result(&mut out, &report),
            Reporter::Json => print_json_result(&report)?,
        }

        let stop = args.bail && matches!(report.status, CaseStatus::Failed | CaseStatus::Errored);
        reports.push(report);
        if stop {
            break;
        }
    }

    let duration_secs = overall_start.elapsed().as_secs_f64();
    match args.reporter {
        Reporter::Json => print_json_summary(&summary, duration_secs)?,
        Reporter::Dot => {
            out.newline();
            print_failure_details(&mut out, &reports);
            print_summary(&mut out, &summary, duration_secs);
        }
        Reporter::Default => {
            print_failure_details(&mut out, &reports);
            print_summary(&mut out, &summary, duration_secs);
        }
    }
    out.flush();

    if summary.total() == 0 {
        log::warn!(
            "no fixtures matched in {} ({})",
            corpus.dir().display(),
            corpus.pattern()
        );
    }

    Ok(!summary.has_failures())
}

// ── Default Reporter ─────────────────────────────────────────────────────

fn print_default_result(out: &mut StyledOutput, report: &CaseReport) {
    match report.status {
        CaseStatus::Passed => out.pass_badge(),
        CaseStatus::Failed => out.fail_badge(),
        CaseStatus::Skipped => out.skip_badge(),
        CaseStatus::Errored => out.error_badge(),
    }
    out.plain(&format!("  {}", report.name));
    out.dim(&format!(" ({:.0}ms)", report.duration_ms));
    if report.status == CaseStatus::Skipped {
        if let Some(ref reason) = report.detail {
            out.dim(&format!("  {}", reason));
        }
    }
    out.newline();
}

// ── Dot Reporter ─────────────────────────────────────────────────────────

fn print_dot_result(out: &mut StyledOutput, report: &CaseReport) {
    match report.status {
        CaseStatus::Passed => out.write_styled(".", Some(Color::Green), false),
        CaseStatus::Failed => out.write_styled("F", Some(Color::Red), true),
        CaseStatus::Skipped => out.write_styled("s", Some(Color::Yellow), false),
        CaseStatus::Errored => out.write_styled("E", Some(Color::Magenta), true),
    }
    out.flush();
}

// ── JSON Reporter ────────────────────────────────────────────────────────

fn print_json_result(report: &CaseReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

fn print_json_summary(summary: &RunSummary, duration_secs: f64) -> anyhow::Result<()> {
    let value = serde_json::json!({
        "summary": true,
        "total": summary.total(),
        "passed": summary.passed,
        "failed": summary.failed,
        "skipped": summary.skipped,
        "errored": summary.errored,
        "duration_secs": duration_secs,
    });
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}

// ── Failure Details ──────────────────────────────────────────────────────

fn print_failure_details(out: &mut StyledOutput, reports: &[CaseReport]) {
    let mut header_printed = false;

    for report in reports {
        if !matches!(report.status, CaseStatus::Failed | CaseStatus::Errored) {
            continue;
        }

        if !header_printed {
            header_printed = true;
            out.newline();
            out.dim("──────────────────────────────────────────");
            out.newline();
            out.newline();
        }

        out.write_styled("  ● ", Some(Color::Red), true);
        out.write_styled(&report.name, Some(Color::Red), true);
        out.newline();
        out.newline();

        match (&report.expected, &report.actual) {
            (Some(expected), Some(actual)) => {
                out.plain("    ");
                out.write_styled(&format!("Expected: {:?}", expected), Some(Color::Green), false);
                out.newline();
                out.plain("    ");
                out.write_styled(&format!("Received: {:?}", actual), Some(Color::Red), false);
                out.newline();
            }
            _ => {
                if let Some(ref detail) = report.detail {
                    for line in detail.lines() {
                        out.plain("    ");
                        out.plain(line);
                        out.newline();
                    }
                }
            }
        }

        out.newline();
        out.dim(&format!("    at {}", report.path.display()));
        out.newline();
        out.newline();
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

fn print_summary(out: &mut StyledOutput, summary: &RunSummary, duration_secs: f64) {
    out.newline();
    out.dim("──────────────────────────────────────────");
    out.newline();

    out.bold("Cases:  ");
    if summary.failed > 0 {
        out.error(&format!("{} failed", summary.failed));
        out.plain(", ");
    }
    if summary.errored > 0 {
        out.error(&format!("{} errored", summary.errored));
        out.plain(", ");
    }
    if summary.passed > 0 {
        out.success(&format!("{} passed", summary.passed));
        out.plain(", ");
    }
    if summary.skipped > 0 {
        out.warning(&format!("{} skipped", summary.skipped));
        out.plain(", ");
    }
    out.bold(&format!("{} total", summary.total()));
    out.newline();

    out.bold("Time:   ");
    out.dim(&format!("{:.2}s", duration_secs));
    out.newline();
}
