//! HTTP probing for the dev server: readiness polling and retried route checks.
//!
//! Both loops use a fixed interval and a fixed ceiling with no backoff.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-request timeout while polling for readiness.
pub const POLL_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-request timeout for route checks.
pub const ROUTE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for talking to a local dev server. Proxies are bypassed.
pub fn client() -> Result<Client, String> {
    Client::builder()
        .no_proxy()
        .build()
        .map_err(|e| format!("HTTP client setup failed: {e}"))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The ceiling elapsed without a response.
    TimedOut,
}

/// Poll `url` every `interval` until any HTTP response arrives or `ceiling`
/// elapses.
///
/// `still_running` is consulted between attempts. A launcher that exits is
/// logged once but does not end the wait: it may have left the server
/// running in the background.
pub fn wait_for_server(
    client: &Client,
    url: &str,
    ceiling: Duration,
    interval: Duration,
    mut still_running: impl FnMut() -> bool,
) -> Readiness {
    let started = Instant::now();
    let mut attempt = 0u32;
    let mut exit_logged = false;
    while started.elapsed() < ceiling {
        attempt += 1;
        match client.get(url).timeout(POLL_REQUEST_TIMEOUT).send() {
            Ok(resp) => {
                debug!(url, attempt, status = resp.status().as_u16(), "server answered");
                return Readiness::Ready;
            }
            Err(e) => debug!(url, attempt, error = %e, "server not ready"),
        }
        if !exit_logged && !still_running() {
            warn!(url, attempt, "dev server launcher exited; still polling");
            exit_logged = true;
        }
        thread::sleep(interval);
    }
    Readiness::TimedOut
}

/// GET `url` up to `retries` times, `delay` apart. Passes only on HTTP 200.
///
/// Any other non-error status fails at once. Only 4xx/5xx statuses and
/// transport errors are retried; the last one becomes the message.
pub fn check_url(client: &Client, url: &str, retries: u32, delay: Duration) -> Result<String, String> {
    let attempts = retries.max(1);
    let mut last = String::from("Max retries exceeded");
    for attempt in 1..=attempts {
        match client.get(url).timeout(ROUTE_REQUEST_TIMEOUT).send() {
            Ok(resp) if resp.status() == StatusCode::OK => {
                return Ok(format!("Status: {}", resp.status().as_u16()));
            }
            Ok(resp) if !resp.status().is_client_error() && !resp.status().is_server_error() => {
                return Err(format!("Status: {}", resp.status().as_u16()));
            }
            Ok(resp) => last = format!("Status: {}", resp.status().as_u16()),
            Err(e) => last = e.to_string(),
        }
        debug!(url, attempt, result = %last, "route check attempt failed");
        if attempt < attempts {
            thread::sleep(delay);
        }
    }
    Err(last)
}
