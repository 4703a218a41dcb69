//! Delivery driver: sends messages in order and commits the cursor after
//! each one.
//!
//! A message counts as delivered only when every chunk of it was accepted.
//! The first failure stops the batch so that a newer entry is never
//! committed while an older one is still outstanding; the next cycle picks
//! up from the last committed cursor. There is no retry inside a cycle.

pub mod telegram;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{DeliveryState, NotificationMessage};
use crate::store::StateStore;

pub use telegram::TelegramTransport;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rejected by messaging API (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Messaging endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Longest text accepted by a single [`send`](Transport::send), in characters.
    fn max_message_len(&self) -> usize;

    async fn send(&self, chat_id: &str, text: &str) -> std::result::Result<(), DeliveryError>;
}

#[derive(Debug)]
pub struct FailedDelivery {
    pub entry_id: String,
    /// Zero-based index of the chunk that failed.
    pub chunk: usize,
    pub error: DeliveryError,
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Entry ids delivered and committed, in order.
    pub delivered: Vec<String>,
    pub failed: Option<FailedDelivery>,
    /// Entry ids left for the next cycle after the failure.
    pub not_attempted: Vec<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// Entries that will be offered again next cycle.
    pub fn deferred(&self) -> usize {
        usize::from(self.failed.is_some()) + self.not_attempted.len()
    }
}

/// Splits rendered HTML into pieces of at most `max_len` characters.
///
/// Cuts never fall inside a tag or an entity. Elements still open at a cut
/// are closed at the end of the piece and reopened at the start of the next
/// one, so each piece parses on its own. A single tag or entity longer than
/// `max_len` is kept whole.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut open: Vec<OpenTag<'_>> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut has_content = false;

    for token in tokenize(text) {
        let token_len = token.raw.chars().count();
        let closing_after = match token.kind {
            Markup::Open(name) => closing_len(&open) + name.len() + 3,
            Markup::Close(name) if open.iter().any(|t| t.name == name) => {
                closing_len(&open) - (name.len() + 3)
            }
            _ => closing_len(&open),
        };

        if has_content && current_len + token_len + closing_after > max_len {
            close_all(&mut current, &open);
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            for tag in &open {
                current.push_str(tag.raw);
                current_len += tag.raw.chars().count();
            }
            has_content = false;
        }

        current.push_str(token.raw);
        current_len += token_len;
        has_content = true;

        match token.kind {
            Markup::Open(name) => open.push(OpenTag {
                name,
                raw: token.raw,
            }),
            Markup::Close(name) => {
                if let Some(pos) = open.iter().rposition(|t| t.name == name) {
                    open.remove(pos);
                }
            }
            Markup::Text => {}
        }
    }

    if has_content {
        close_all(&mut current, &open);
        chunks.push(current);
    }
    chunks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Markup<'a> {
    Open(&'a str),
    Close(&'a str),
    Text,
}

struct Token<'a> {
    raw: &'a str,
    kind: Markup<'a>,
}

struct OpenTag<'a> {
    name: &'a str,
    raw: &'a str,
}

/// Breaks `text` into tags, entities and single characters.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let len = match c {
            '<' => rest.find('>').map(|idx| idx + 1),
            '&' => entity_len(rest),
            _ => None,
        }
        .unwrap_or(c.len_utf8());

        let (raw, tail) = rest.split_at(len);
        tokens.push(Token {
            raw,
            kind: classify(raw),
        });
        rest = tail;
    }

    tokens
}

/// Length of a `&name;` or `&#123;` reference at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let end = s.char_indices().take(12).find(|&(_, c)| c == ';')?.0;
    let name = &s[1..end];
    (!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#'))
        .then_some(end + 1)
}

fn classify(raw: &str) -> Markup<'_> {
    let Some(inner) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) else {
        return Markup::Text;
    };
    if inner.ends_with('/') {
        return Markup::Text;
    }

    let (closing, inner) = match inner.strip_prefix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    match (&inner[..end], closing) {
        ("", _) => Markup::Text,
        (name, true) => Markup::Close(name),
        (name, false) => Markup::Open(name),
    }
}

fn closing_len(open: &[OpenTag<'_>]) -> usize {
    open.iter().map(|t| t.name.len() + 3).sum()
}

fn close_all(out: &mut String, open: &[OpenTag<'_>]) {
    for tag in open.iter().rev() {
        out.push_str("</");
        out.push_str(tag.name);
        out.push('>');
    }
}

/// Delivers `messages` in order, committing `state` through `store` after
/// each success.
///
/// Only a failure to persist state is returned as an error; transport
/// failures end up in the report.
pub async fn deliver_all(
    messages: &[NotificationMessage],
    transport: &dyn Transport,
    chat_id: &str,
    store: &dyn StateStore,
    state: &mut DeliveryState,
) -> Result<DeliveryReport> {
    let mut report = DeliveryReport::default();

    for (idx, message) in messages.iter().enumerate() {
        if let Err((chunk, error)) = send_message(message, transport, chat_id).await {
            tracing::error!(
                "Failed to deliver {} (chunk {}): {}",
                message.entry_id,
                chunk + 1,
                error
            );
            report.failed = Some(FailedDelivery {
                entry_id: message.entry_id.clone(),
                chunk,
                error,
            });
            report.not_attempted = messages[idx + 1..]
                .iter()
                .map(|m| m.entry_id.clone())
                .collect();
            break;
        }

        state.advance_to(&message.entry_id);
        store.save(state)?;
        tracing::info!("Delivered {}", message.entry_id);
        report.delivered.push(message.entry_id.clone());
    }

    Ok(report)
}

async fn send_message(
    message: &NotificationMessage,
    transport: &dyn Transport,
    chat_id: &str,
) -> std::result::Result<(), (usize, DeliveryError)> {
    let text = message.render();
    let chunks = split_chunks(&text, transport.max_message_len());
    if chunks.len() > 1 {
        tracing::debug!(
            "Message for {} split into {} chunks",
            message.entry_id,
            chunks.len()
        );
    }

    for (idx, chunk) in chunks.iter().enumerate() {
        transport.send(chat_id, chunk).await.map_err(|e| (idx, e))?;
    }
    Ok(())
}
