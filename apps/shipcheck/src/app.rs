//! App validator: dev server boots, serves its routes, and writes logs.
//!
//! Steps run in a fixed order and every outcome lands in the `Report`:
//! 1. reclaim the validation port
//! 2. launch the dev server in its own process group
//! 3. wait for it to answer HTTP
//! 4. check `/` and the health route (only when ready)
//! 5. check `logs/*.log` (always)
//!
//! The server is torn down before returning, on every path.

use crate::baseline::report_missing_dir;
use crate::config::AppSettings;
use crate::models::Report;
use crate::probe::{self, Readiness};
use crate::process::{self, DevServer};
use glob::glob;
use std::path::Path;
use tracing::{debug, info, warn};

pub const REPORT_TITLE: &str = "APP VALIDATION";

/// Lines of server output kept for diagnosis when the server never answers.
const OUTPUT_TAIL_LINES: usize = 20;
/// PATH is cut to this many characters in the environment dump.
const PATH_PREVIEW_CHARS: usize = 200;

#[derive(Debug, PartialEq, Eq)]
pub enum LogsProblem {
    MissingDir,
    NoLogFiles,
}

/// Count `*.log` files directly under `project_dir/logs_dir`.
pub fn check_logs(project_dir: &Path, logs_dir: &str) -> Result<usize, LogsProblem> {
    let dir = project_dir.join(logs_dir);
    if !dir.exists() {
        return Err(LogsProblem::MissingDir);
    }
    let pattern = format!(
        "{}/*.log",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let count = match glob(&pattern) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).count(),
        Err(_) => 0,
    };
    if count == 0 {
        Err(LogsProblem::NoLogFiles)
    } else {
        Ok(count)
    }
}

/// Run the full app validation against `project_dir`.
pub fn run_app(project_dir: &Path, settings: &AppSettings) -> Report {
    let mut report = Report::new(REPORT_TITLE);
    log_environment(project_dir, &settings.runner);
    if !project_dir.exists() {
        report_missing_dir(&mut report, project_dir);
        return report;
    }

    info!("Starting dev server on port {}...", settings.port);
    if process::reclaim_port(settings.port) > 0 {
        info!("Killed existing process(es) on port {}", settings.port);
    }
    let server = match DevServer::spawn(&settings.runner, &settings.resolved_dev_args(), project_dir) {
        Ok(mut server) => {
            check_server(&mut report, &mut server, settings);
            Some(server)
        }
        Err(e) => {
            report.fail(
                "dev server start",
                Some(e.to_string()),
                format!("Dev server failed to launch: {e}"),
            );
            None
        }
    };

    info!("Checking logs exist...");
    match check_logs(project_dir, &settings.logs_dir) {
        Ok(n) => report.pass("logs exist", Some(format!("{n} file(s)"))),
        Err(LogsProblem::MissingDir) => report.fail(
            "logs directory missing",
            None,
            "Logs directory does not exist".into(),
        ),
        Err(LogsProblem::NoLogFiles) => report.fail(
            "no log files",
            None,
            format!("No .log files found in {}/", settings.logs_dir),
        ),
    }

    if let Some(server) = server {
        info!("Stopping dev server...");
        server.shutdown();
    }
    report
}

/// Dump what the dev server will inherit, for diagnosing harness failures.
fn log_environment(project_dir: &Path, runner: &str) {
    let var = |key: &str| std::env::var(key).unwrap_or_else(|_| "NOT SET".into());
    let cwd = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|e| format!("unavailable ({e})"));
    let path: String = var("PATH").chars().take(PATH_PREVIEW_CHARS).collect();
    debug!(
        project_dir = %project_dir.display(),
        exists = project_dir.exists(),
        cwd = %cwd,
        "app validation environment"
    );
    debug!(
        path = %path,
        home = %var("HOME"),
        node_env = %var("NODE_ENV"),
        user = %var("USER"),
        "environment variables"
    );
    let mut programs = vec![runner];
    if runner != "node" {
        programs.push("node");
    }
    for program in programs {
        match process::find_on_path(program) {
            Some(found) => debug!(program, path = %found.display(), "found on PATH"),
            None => debug!(program, "not found on PATH"),
        }
    }
}

/// Readiness wait followed by the two route checks.
fn check_server(report: &mut Report, server: &mut DevServer, settings: &AppSettings) {
    let client = match probe::client() {
        Ok(c) => c,
        Err(e) => {
            report.fail("dev server start", Some(e.clone()), e);
            return;
        }
    };
    let base_url = settings.base_url();
    let ceiling = settings.ready_timeout;
    let readiness = probe::wait_for_server(&client, &base_url, ceiling, settings.poll_interval, || {
        !server.has_exited()
    });
    match readiness {
        Readiness::Ready => report.pass("dev server started", None),
        Readiness::TimedOut => {
            warn!(tail = %server.output_tail(OUTPUT_TAIL_LINES), "dev server never answered");
            report.fail(
                "dev server start",
                None,
                format!("Dev server failed to start within {}s", ceiling.as_secs()),
            );
            return;
        }
    }

    info!("Checking main route...");
    match probe::check_url(&client, &base_url, settings.route_retries, settings.retry_delay) {
        Ok(_) => report.pass("main route", None),
        Err(msg) => report.fail("main route", Some(msg.clone()), format!("Main route failed: {msg}")),
    }

    info!("Checking health route...");
    match probe::check_url(
        &client,
        &settings.health_url(),
        settings.route_retries,
        settings.retry_delay,
    ) {
        Ok(_) => report.pass("health route", None),
        Err(msg) => report.fail(
            "health route",
            Some(msg.clone()),
            format!("Health route failed: {msg}"),
        ),
    }
}
