//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shipcheck",
    version,
    about = "Acceptance checks for web app projects",
    long_about = "shipcheck — validate that a project passes its checks and tests, boots its dev server, serves its routes, and writes logs; and post results to a chat webhook.\n\nConfiguration precedence: CLI > shipcheck.toml > defaults.",
    after_help = "Examples:\n  shipcheck baseline ./my-app\n  shipcheck app ./my-app --output json\n  shipcheck notify \"Deploy finished\" --title Release\n  cat report.txt | shipcheck notify -c '#builds'",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current shipcheck version.")]
    Version,
    /// Run static checks and tests
    #[command(
        about = "Run baseline validation",
        long_about = "Run the project's static-check and test commands (default: pnpm check, pnpm test) with a 300s ceiling each. A zero-exit test run whose output reports FAIL still fails.",
        after_help = "Examples:\n  shipcheck baseline ./my-app\n  shipcheck baseline ./my-app --output json"
    )]
    Baseline {
        #[arg(help = "Project directory to validate")]
        project_dir: String,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Boot the dev server and probe it
    #[command(
        about = "Run app validation",
        long_about = "Start the dev server on port 3030, wait for it to answer, check / and /api/health, check logs/*.log, then stop the server and its process group.",
        after_help = "Examples:\n  shipcheck app ./my-app"
    )]
    App {
        #[arg(help = "Project directory to validate")]
        project_dir: String,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Post a message to the chat webhook
    #[command(
        about = "Post to webhook",
        long_about = "Post a message to the webhook in PW_SPARK_WEBHOOK_URL. The message comes from the argument or from piped stdin. Default channel: PW_SPARK_CHANNEL.",
        after_help = "Examples:\n  shipcheck notify \"All checks passed\" -t \"Nightly\"\n  echo done | shipcheck notify"
    )]
    Notify {
        #[arg(help = "Message to post (or pipe via stdin)")]
        message: Option<String>,
        #[arg(short = 't', long, help = "Header title for the message")]
        title: Option<String>,
        #[arg(short = 'c', long, help = "Override channel (default: PW_SPARK_CHANNEL)")]
        channel: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notify_short_flags() {
        let cli = Cli::try_parse_from(["shipcheck", "notify", "hi", "-t", "T", "-c", "#ops"]).unwrap();
        match cli.cmd {
            Commands::Notify {
                message,
                title,
                channel,
            } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert_eq!(title.as_deref(), Some("T"));
                assert_eq!(channel.as_deref(), Some("#ops"));
            }
            _ => panic!("expected notify"),
        }
    }

    #[test]
    fn test_validators_require_project_dir() {
        assert!(Cli::try_parse_from(["shipcheck", "app"]).is_err());
        assert!(Cli::try_parse_from(["shipcheck", "baseline"]).is_err());
        assert!(Cli::try_parse_from(["shipcheck", "baseline", "."]).is_ok());
    }
}
