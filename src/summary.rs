//! Message summaries
//!
//! Maps transport envelopes to [`MessageSummary`] and fetches them for
//! a whole folder. The same mapping backs search results.

use crate::client::MailClient;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::flag::Flag;
use crate::transport::{AccessMode, Connector, FetchRange, RawSummary};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tracing::info;

/// Lightweight view of one message: envelope plus read state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// UID within the folder the summary came from. Stable across
    /// deletion of other messages.
    pub id: u32,
    /// Decoded subject with reply/forward prefixes removed.
    pub subject: String,
    /// Display name of the first sender; empty if there is none.
    pub from: String,
    pub date: Option<DateTime<Utc>>,
    /// Snapshot of `\Seen` being absent at fetch time.
    pub is_unread: bool,
}

impl From<RawSummary> for MessageSummary {
    fn from(raw: RawSummary) -> Self {
        let from = raw
            .from
            .first()
            .and_then(|addr| addr.name.as_deref())
            .map(decode_header)
            .unwrap_or_default();

        let date = raw
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .or(raw.internal_date)
            .map(|d| d.with_timezone(&Utc));

        let subject = raw
            .subject
            .as_deref()
            .map(decode_header)
            .unwrap_or_default();

        Self {
            id: raw.uid,
            subject: normalize_subject(&subject),
            from,
            date,
            is_unread: !raw.flags.contains(&Flag::Seen),
        }
    }
}

/// Decode RFC 2047 encoded words, falling back to the input.
pub(crate) fn decode_header(value: &str) -> String {
    let line = format!("X: {value}");
    mailparse::parse_header(line.as_bytes())
        .map_or_else(|_| value.to_string(), |(header, _)| header.get_value())
}

/// Strip leading `Re:`, `Fw:`, `Fwd:` (any case, optionally with a
/// `[n]` counter, possibly repeated).
pub(crate) fn normalize_subject(subject: &str) -> String {
    let mut rest = subject.trim();
    while let Some(stripped) = strip_reply_prefix(rest) {
        rest = stripped.trim_start();
    }
    rest.to_string()
}

fn strip_reply_prefix(s: &str) -> Option<&str> {
    let word_len = ["fwd", "re", "fw"].iter().find_map(|p| {
        s.get(..p.len())
            .filter(|head| head.eq_ignore_ascii_case(p))
            .map(|_| p.len())
    })?;
    let mut rest = &s[word_len..];
    if let Some(after) = rest.strip_prefix('[') {
        let close = after.find(']')?;
        if !after[..close].chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest = &after[close + 1..];
    }
    rest.strip_prefix(':')
}

impl<C: Connector> MailClient<C> {
    /// Fetch summaries of every message in `folder`
    ///
    /// No pagination: the cost is proportional to the folder size.
    ///
    /// # Errors
    ///
    /// `FolderNotFound` if `folder` does not exist, otherwise
    /// connection, authentication and protocol errors.
    pub async fn fetch_summaries(
        &self,
        credentials: &Credentials,
        folder: &str,
    ) -> Result<Vec<MessageSummary>> {
        let folder = folder.to_string();
        self.sessions()
            .with_session(credentials, AccessMode::ReadOnly, move |session| {
                async move {
                    session.open_folder(&folder).await?;
                    let raw = session.fetch_summaries(&FetchRange::All).await?;
                    info!("Fetched {} summaries from {}", raw.len(), folder);
                    Ok(raw.into_iter().map(MessageSummary::from).collect())
                }
                .boxed()
            })
            .await
    }
}
