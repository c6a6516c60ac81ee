//! Baseline validator: the project's static-check and test commands must pass.
//!
//! The test command is also failed when it exits 0 but its output carries a
//! `FAIL` marker without a `0 failed` summary (case-insensitive).

use crate::config::BaselineSettings;
use crate::models::Report;
use crate::process::{run_with_timeout, Completed};
use std::path::Path;
use tracing::info;

pub const REPORT_TITLE: &str = "BASELINE VALIDATION";

/// True when a zero-exit test run still reports failures in its output.
pub fn output_reports_failures(output: &str) -> bool {
    output.contains("FAIL") && !output.to_lowercase().contains("0 failed")
}

/// Run both baseline commands in `project_dir` and collect the outcome.
pub fn run_baseline(project_dir: &Path, settings: &BaselineSettings) -> Report {
    let mut report = Report::new(REPORT_TITLE);
    if !project_dir.exists() {
        report_missing_dir(&mut report, project_dir);
        return report;
    }

    let check_label = command_label(&settings.runner, &settings.check_args);
    info!("Running {check_label}...");
    match run(project_dir, settings, &settings.check_args) {
        Ok(done) if done.success() => report.pass(&check_label, None),
        Ok(done) => report.fail(
            &check_label,
            None,
            format!("{check_label} failed:\n{}", done.output),
        ),
        Err(output) => report.fail(&check_label, None, format!("{check_label} failed:\n{output}")),
    }

    let test_label = command_label(&settings.runner, &settings.test_args);
    info!("Running {test_label}...");
    match run(project_dir, settings, &settings.test_args) {
        Ok(done) if !done.success() => report.fail(
            &test_label,
            None,
            format!("{test_label} failed:\n{}", done.output),
        ),
        Ok(done) if output_reports_failures(&done.output) => report.fail(
            &test_label,
            Some("errors in output".into()),
            format!("{test_label} passed but output contains errors:\n{}", done.output),
        ),
        Ok(_) => report.pass(&test_label, None),
        Err(output) => report.fail(&test_label, None, format!("{test_label} failed:\n{output}")),
    }

    report
}

/// Run one runner invocation; errors come back as the text to report.
fn run(project_dir: &Path, settings: &BaselineSettings, args: &[String]) -> Result<Completed, String> {
    run_with_timeout(&settings.runner, args, project_dir, settings.timeout).map_err(|e| e.to_string())
}

pub(crate) fn command_label(runner: &str, args: &[String]) -> String {
    std::iter::once(runner)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn report_missing_dir(report: &mut Report, project_dir: &Path) {
    let msg = format!("Directory does not exist: {}", project_dir.display());
    report.fail(msg.clone(), None, msg);
}
