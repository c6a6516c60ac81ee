//! Shared data models: per-check results, the aggregated report, and the
//! webhook payload.

pub mod payload;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
/// Outcome of one discrete check.
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
/// Check results and failure messages accumulated over one validation run.
pub struct Report {
    pub title: String,
    pub checks: Vec<CheckResult>,
    pub failures: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Report {
            title: title.into(),
            checks: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record a passing check.
    pub fn pass(&mut self, name: impl Into<String>, detail: Option<String>) {
        self.checks.push(CheckResult {
            name: name.into(),
            passed: true,
            detail,
        });
    }

    /// Record a failing check along with the message for the final batch.
    pub fn fail(&mut self, name: impl Into<String>, detail: Option<String>, failure: String) {
        self.checks.push(CheckResult {
            name: name.into(),
            passed: false,
            detail,
        });
        self.failures.push(failure);
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit code: 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_drive_exit_code() {
        let mut report = Report::new("APP VALIDATION");
        report.pass("main route", None);
        assert_eq!(report.exit_code(), 0);
        report.fail(
            "logs directory missing",
            None,
            "Logs directory does not exist".into(),
        );
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.failures, vec!["Logs directory does not exist"]);
    }
}
