//! Webhook notifier: chunk a message into display blocks and POST it.

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::models::payload::{Block, Payload, PostOutcome, TextObject};
use reqwest::blocking::Client;
use tracing::debug;

/// Largest section block text the chat service accepts, with headroom.
pub const MAX_BLOCK_CHARS: usize = 2900;
/// Length of the fallback preview text taken from the message.
pub const FALLBACK_TEXT_CHARS: usize = 100;

/// Split `message` into consecutive slices of at most `max` characters.
///
/// Slicing counts Unicode scalar values and ignores word boundaries; joining
/// the chunks yields `message` again. An empty message yields no chunks.
pub fn chunk_message(message: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let chars: Vec<char> = message.chars().collect();
    chars.chunks(max).map(|c| c.iter().collect()).collect()
}

/// Build the webhook body: optional header block, one section per chunk.
pub fn build_payload(message: &str, title: Option<&str>, channel: Option<&str>) -> Payload {
    let title = title.filter(|t| !t.is_empty());
    let mut blocks = Vec::new();
    if let Some(t) = title {
        blocks.push(Block::Header {
            text: TextObject::PlainText {
                text: t.to_string(),
                emoji: true,
            },
        });
    }
    blocks.extend(
        chunk_message(message, MAX_BLOCK_CHARS)
            .into_iter()
            .map(|text| Block::Section {
                text: TextObject::Mrkdwn { text },
            }),
    );
    let text = match title {
        Some(t) => t.to_string(),
        None => message.chars().take(FALLBACK_TEXT_CHARS).collect(),
    };
    Payload {
        blocks,
        text,
        channel: channel.map(str::to_string),
    }
}

/// Client for webhook delivery; honours the system proxy settings.
pub fn http_client() -> Result<Client, NotifyError> {
    Ok(Client::builder().build()?)
}

/// POST `payload` as JSON. HTTP error statuses come back as a failed
/// `PostOutcome` carrying the response body; transport failures are errors.
pub fn post_payload(client: &Client, url: &str, payload: &Payload) -> Result<PostOutcome, NotifyError> {
    let resp = client.post(url).json(payload).send()?;
    let status = resp.status();
    debug!(status = status.as_u16(), "webhook responded");
    if status.is_client_error() || status.is_server_error() {
        let body = resp.text().unwrap_or_default();
        return Ok(PostOutcome {
            ok: false,
            status: status.as_u16(),
            error: Some(body),
        });
    }
    Ok(PostOutcome {
        ok: true,
        status: status.as_u16(),
        error: None,
    })
}

/// Post `message` to the configured webhook.
pub fn send(
    config: &NotifyConfig,
    client: &Client,
    message: &str,
    title: Option<&str>,
) -> Result<PostOutcome, NotifyError> {
    let payload = build_payload(message, title, config.channel.as_deref());
    debug!(blocks = payload.blocks.len(), "posting to webhook");
    post_payload(client, &config.webhook_url, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHANNEL_ENV, WEBHOOK_URL_ENV};
    use crate::testing::ScriptedServer;
    use serde_json::Value as Json;

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn send_with_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        client: &Client,
        message: &str,
        title: Option<&str>,
        cli_channel: Option<&str>,
    ) -> Result<PostOutcome, NotifyError> {
        let config = NotifyConfig::from_lookup(lookup, cli_channel)?;
        send(&config, client, message, title)
    }

    fn body_json(raw_request: &str) -> Json {
        let (_, body) = raw_request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_short_message_is_single_chunk() {
        assert_eq!(chunk_message("abc", MAX_BLOCK_CHARS), vec!["abc"]);
        assert!(chunk_message("", MAX_BLOCK_CHARS).is_empty());
    }

    #[test]
    fn test_long_message_chunks_reassemble() {
        let message: String = (0..6000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_message(&message, MAX_BLOCK_CHARS);
        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lens, vec![2900, 2900, 200]);
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn test_chunks_count_characters_not_bytes() {
        let message = "é".repeat(3000);
        let chunks = chunk_message(&message, MAX_BLOCK_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn test_payload_with_title_and_channel() {
        let payload = build_payload("deploy finished", Some("Release"), Some("#ops"));
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["text"], "Release");
        assert_eq!(v["channel"], "#ops");
        assert_eq!(v["blocks"][0]["type"], "header");
        assert_eq!(v["blocks"][0]["text"]["type"], "plain_text");
        assert_eq!(v["blocks"][0]["text"]["emoji"], true);
        assert_eq!(v["blocks"][1]["type"], "section");
        assert_eq!(v["blocks"][1]["text"]["type"], "mrkdwn");
        assert_eq!(v["blocks"][1]["text"]["text"], "deploy finished");
    }

    #[test]
    fn test_payload_fallback_text_and_no_channel() {
        let message = "x".repeat(250);
        let payload = build_payload(&message, None, None);
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["text"].as_str().unwrap().len(), FALLBACK_TEXT_CHARS);
        assert!(v.get("channel").is_none());
        assert_eq!(v["blocks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_post_success_sends_json_body() {
        let hook = ScriptedServer::start(vec![(200, "ok")]);
        let url = hook.url("/services/T000/B000");
        let lookup = move |key: &str| match key {
            WEBHOOK_URL_ENV => Some(url.clone()),
            CHANNEL_ENV => Some("#builds".to_string()),
            _ => None,
        };
        let outcome = send_with_lookup(lookup, &local_client(), "all green", Some("CI"), None).unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.status, 200);

        let requests = hook.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /services/T000/B000 "));
        assert!(requests[0]
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        let body = body_json(&requests[0]);
        assert_eq!(body["channel"], "#builds");
        assert_eq!(body["text"], "CI");
        assert_eq!(body["blocks"][1]["text"]["text"], "all green");
    }

    #[test]
    fn test_http_error_is_returned_not_raised() {
        let hook = ScriptedServer::start(vec![(404, "no_service")]);
        let config = NotifyConfig {
            webhook_url: hook.url("/hook"),
            channel: None,
        };
        let outcome = send(&config, &local_client(), "hello", None).unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.error.as_deref(), Some("no_service"));
    }

    #[test]
    fn test_missing_webhook_url_makes_no_request() {
        let hook = ScriptedServer::start(vec![(200, "ok")]);
        let err = send_with_lookup(|_| None, &local_client(), "hello", None, Some("#ops")).unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
        assert_eq!(hook.hits(), 0);
    }
}
