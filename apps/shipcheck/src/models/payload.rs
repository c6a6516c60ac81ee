//! Chat webhook payload schema (`blocks` + fallback `text` + optional `channel`).

use serde::Serialize;

#[derive(Debug, Serialize)]
/// Body POSTed to the webhook.
pub struct Payload {
    pub blocks: Vec<Block>,
    /// Short preview shown by notification surfaces.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Display block kinds used by the notifier.
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

#[derive(Debug, Serialize)]
/// Result of a completed webhook POST.
pub struct PostOutcome {
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
