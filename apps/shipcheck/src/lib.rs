//! shipcheck core library.
//!
//! Acceptance tooling for web app projects, exposed as programmatic APIs that
//! the `shipcheck` binary drives.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Project config discovery, effective settings, webhook env config.
//! - `baseline`: Static-check and test command validation.
//! - `app`: Dev server lifecycle, route probes, and log presence validation.
//! - `notify`: Message chunking, webhook payloads, and delivery.
//! - `process`: Bounded command runs and the process-group guard.
//! - `probe`: HTTP readiness polling and retried route checks.
//! - `models`: Report and payload structs.
//! - `output`: Human/JSON printers for reports.
//! - `utils`: Supporting helpers.
pub mod app;
pub mod baseline;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod output;
pub mod probe;
pub mod process;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
