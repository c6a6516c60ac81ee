//! Output rendering for validation reports.
//!
//! Supports `human` (default) and `json` outputs. The JSON form carries the
//! individual checks, the failure messages, and a summary.

use crate::models::{CheckResult, Report};
use crate::utils::colors_enabled;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

const RULE: &str = "==================================================";

fn use_colors(output: &str) -> bool {
    output != "json" && colors_enabled()
}

fn check_line(check: &CheckResult, color: bool) -> String {
    let label = match (check.passed, color) {
        (true, true) => "PASS:".green().bold().to_string(),
        (true, false) => "PASS:".to_string(),
        (false, true) => "FAIL:".red().bold().to_string(),
        (false, false) => "FAIL:".to_string(),
    };
    match &check.detail {
        Some(d) => format!("{} {} ({})", label, check.name, d),
        None => format!("{} {}", label, check.name),
    }
}

/// Print a report in the requested format.
pub fn print_report(report: &Report, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(report)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
        },
        _ => {
            let color = use_colors(output);
            for check in &report.checks {
                println!("{}", check_line(check, color));
            }
            let verdict = if report.passed() { "PASSED" } else { "FAILED" };
            let banner = format!("{} {}", report.title, verdict);
            println!("\n{}", RULE);
            match (color, report.passed()) {
                (true, true) => println!("{}", banner.green().bold()),
                (true, false) => println!("{}", banner.red().bold()),
                _ => println!("{}", banner),
            }
            println!("{}", RULE);
            for failure in &report.failures {
                println!("\n{}", failure);
            }
        }
    }
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    let passed = report.checks.iter().filter(|c| c.passed).count();
    json!({
        "title": report.title,
        "passed": report.passed(),
        "checks": report.checks,
        "failures": report.failures,
        "summary": {
            "passed": passed,
            "failed": report.checks.len() - passed,
            "total": report.checks.len(),
        },
    })
}
