//! shipcheck CLI binary entry point.
//! Delegates to library modules and maps outcomes to exit codes.

use clap::Parser;
use shipcheck::cli::{Cli, Commands};
use shipcheck::config::{self, NotifyConfig};
use shipcheck::utils::{error_prefix, note_prefix};
use shipcheck::{app, baseline, notify, output};
use std::io::{IsTerminal, Read};

fn main() {
    // Diagnostics go to stderr so JSON reports on stdout stay parseable
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help and --version exit 0
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let code = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::Baseline {
            project_dir,
            output: mode,
        } => {
            let eff = config::resolve_effective(&project_dir, mode.as_deref());
            let report = baseline::run_baseline(&eff.project_dir, &eff.baseline);
            output::print_report(&report, &eff.output);
            report.exit_code()
        }
        Commands::App {
            project_dir,
            output: mode,
        } => {
            let eff = config::resolve_effective(&project_dir, mode.as_deref());
            let report = app::run_app(&eff.project_dir, &eff.app);
            output::print_report(&report, &eff.output);
            report.exit_code()
        }
        Commands::Notify {
            message,
            title,
            channel,
        } => run_notify(message, title, channel),
    };
    std::process::exit(code);
}

fn run_notify(message: Option<String>, title: Option<String>, channel: Option<String>) -> i32 {
    let config = match NotifyConfig::from_env(channel.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", error_prefix(), e);
            return 1;
        }
    };
    let message = match message.filter(|m| !m.is_empty()) {
        Some(m) => m,
        None if !std::io::stdin().is_terminal() => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("{} failed to read stdin: {}", error_prefix(), e);
                return 1;
            }
            buf.trim().to_string()
        }
        None => {
            eprintln!(
                "{} No message provided. Pass as argument or pipe via stdin.",
                error_prefix()
            );
            return 1;
        }
    };
    if message.is_empty() {
        eprintln!("{} posting an empty message", note_prefix());
    }
    let result = notify::http_client()
        .and_then(|client| notify::send(&config, &client, &message, title.as_deref()));
    match result {
        Ok(outcome) if outcome.ok => {
            println!("Posted to Slack");
            0
        }
        Ok(outcome) => {
            eprintln!(
                "Failed: {}",
                outcome.error.as_deref().unwrap_or("Unknown error")
            );
            1
        }
        Err(e) => {
            eprintln!("Failed: {}", e);
            1
        }
    }
}
