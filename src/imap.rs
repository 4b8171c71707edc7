//! IMAP transport over async-imap
//!
//! All message addressing uses UID commands (`UID FETCH`, `UID SEARCH`,
//! `UID STORE`), so identifiers stay valid when other messages are
//! expunged.

use crate::config::MailConfig;
use crate::connection::{self, TlsCompat};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::Folder;
use crate::transport::{
    AccessMode, Address, Connector, FetchRange, Namespace, RawSummary, SearchField, Transport,
};
use async_imap::error::Error as ImapError;
use async_imap::types::{Fetch, Flag as ImapFlag, Name};
use futures::{AsyncReadExt, AsyncWriteExt, TryStreamExt};
use tracing::{debug, info, warn};

/// A logged-in async-imap session over TLS.
pub type ImapSession = async_imap::Session<TlsCompat>;

const SUMMARY_QUERY: &str = "(UID FLAGS INTERNALDATE ENVELOPE)";
const BODY_QUERY: &str = "(UID BODY.PEEK[])";
const NAMESPACE_TAG: &str = "NS1";
const MAX_LINE: usize = 8192;

/// Opens [`ImapTransport`]s to the configured server.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    config: MailConfig,
}

impl ImapConnector {
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &MailConfig {
        &self.config
    }

    async fn login(&self, credentials: &Credentials) -> Result<ImapTransport> {
        let client = connection::connect(&self.config).await?;
        let session = client
            .login(credentials.username(), credentials.password())
            .await
            .map_err(|(e, _)| login_error(e))?;

        info!("Connected to IMAP server");
        Ok(ImapTransport { session, exists: 0 })
    }
}

impl Connector for ImapConnector {
    type Transport = ImapTransport;

    async fn open(&self, credentials: &Credentials) -> Result<ImapTransport> {
        let limit = self.config.connect_timeout;
        tokio::time::timeout(limit, self.login(credentials))
            .await
            .map_err(|_| Error::Connection(format!("Timed out after {limit:?}")))?
    }
}

/// One authenticated IMAP connection.
pub struct ImapTransport {
    session: ImapSession,
    /// Message count of the open folder.
    exists: u32,
}

impl Transport for ImapTransport {
    async fn open_folder(&mut self, path: &str, mode: AccessMode) -> Result<()> {
        let opened = match mode {
            AccessMode::ReadOnly => self.session.examine(path).await,
            AccessMode::ReadWrite => self.session.select(path).await,
        };
        let mailbox = opened.map_err(|e| match e {
            ImapError::No(_) => Error::FolderNotFound(path.to_string()),
            other => imap_error(&format!("Failed to open {path}"), other),
        })?;
        debug!("{} holds {} messages", path, mailbox.exists);
        self.exists = mailbox.exists;
        Ok(())
    }

    async fn personal_namespace(&mut self) -> Result<Namespace> {
        let capabilities = self
            .session
            .capabilities()
            .await
            .map_err(|e| imap_error("Capability lookup failed", e))?;
        if capabilities.has_str("NAMESPACE") {
            let reply = self.namespace_reply().await?;
            let namespace = parse_personal_namespace(&reply)?
                .ok_or_else(|| Error::Protocol("Server reported no personal namespace".into()))?;
            debug!(prefix = %namespace.prefix, "Personal namespace");
            return Ok(namespace);
        }

        // Without NAMESPACE, `LIST "" ""` reports the hierarchy root.
        let roots: Vec<Name> = self
            .session
            .list(Some(""), None)
            .await
            .map_err(|e| imap_error("Namespace lookup failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("Namespace lookup failed", e))?;

        let root = roots
            .first()
            .ok_or_else(|| Error::Protocol("Server reported no personal namespace".into()))?;
        Ok(Namespace {
            prefix: String::new(),
            delimiter: root.delimiter().map(str::to_string),
        })
    }

    async fn list_folders(&mut self, namespace: &Namespace) -> Result<Vec<Folder>> {
        let pattern = if namespace.prefix.is_empty() {
            "*".to_string()
        } else {
            quote(&format!("{}*", namespace.prefix))
        };

        let names: Vec<Name> = self
            .session
            .list(Some(""), Some(pattern.as_str()))
            .await
            .map_err(|e| imap_error("List folders failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("List folders failed", e))?;

        Ok(names
            .iter()
            .map(|name| Folder::new(name.name(), name.delimiter()))
            .collect())
    }

    async fn fetch_summaries(&mut self, range: &FetchRange) -> Result<Vec<RawSummary>> {
        let uid_set = match range {
            FetchRange::All if self.exists == 0 => return Ok(Vec::new()),
            FetchRange::All => "1:*".to_string(),
            FetchRange::Uids(uids) if uids.is_empty() => return Ok(Vec::new()),
            FetchRange::Uids(uids) => uid_set(uids),
        };

        let fetches: Vec<Fetch> = self
            .session
            .uid_fetch(&uid_set, SUMMARY_QUERY)
            .await
            .map_err(|e| imap_error("Fetch failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("Fetch error", e))?;

        Ok(fetches.iter().filter_map(raw_summary).collect())
    }

    async fn fetch_message(&mut self, uid: u32) -> Result<Option<Vec<u8>>> {
        let fetches: Vec<Fetch> = self
            .session
            .uid_fetch(uid.to_string(), BODY_QUERY)
            .await
            .map_err(|e| imap_error("Fetch failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("Fetch error", e))?;

        Ok(fetches
            .iter()
            .find(|f| f.uid.is_none_or(|u| u == uid))
            .and_then(Fetch::body)
            .map(<[u8]>::to_vec))
    }

    async fn search_field(&mut self, field: SearchField, text: &str) -> Result<Vec<u32>> {
        let criterion = format!("{} {}", field.as_search_key(), quote(text));
        let query = if text.is_ascii() {
            criterion
        } else {
            format!("CHARSET UTF-8 {criterion}")
        };

        let mut uids: Vec<u32> = self
            .session
            .uid_search(&query)
            .await
            .map_err(|e| imap_error("Search failed", e))?
            .into_iter()
            .collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn set_flag(&mut self, uid: u32, flag: &Flag, value: bool) -> Result<bool> {
        let updated: Vec<Fetch> = self
            .session
            .uid_store(uid.to_string(), flag.store_query(value))
            .await
            .map_err(|e| imap_error("Store failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("Store error", e))?;
        if !updated.is_empty() {
            return Ok(true);
        }

        // Servers may stay silent when the flag was already in place.
        let found = self
            .session
            .uid_search(format!("UID {uid}"))
            .await
            .map_err(|e| imap_error("Search failed", e))?;
        Ok(found.contains(&uid))
    }

    async fn expunge(&mut self) -> Result<usize> {
        let removed: Vec<u32> = self
            .session
            .expunge()
            .await
            .map_err(|e| imap_error("Expunge failed", e))?
            .try_collect()
            .await
            .map_err(|e| imap_error("Expunge error", e))?;
        Ok(removed.len())
    }

    async fn disconnect(mut self) -> Result<()> {
        self.session
            .logout()
            .await
            .map_err(|e| imap_error("Logout failed", e))
    }
}

impl ImapTransport {
    /// Run `NAMESPACE` (RFC 2342) and return its untagged data line.
    ///
    /// async-imap cannot parse NAMESPACE replies, and a reply it fails
    /// to parse stays in its read buffer, so the exchange runs on the
    /// raw stream. That buffer is empty between completed commands.
    async fn namespace_reply(&mut self) -> Result<String> {
        let stream = self.session.get_mut();
        stream
            .write_all(format!("{NAMESPACE_TAG} NAMESPACE\r\n").as_bytes())
            .await?;
        stream.flush().await?;

        let mut reply = None;
        loop {
            let line = read_line(stream).await?;
            if let Some(status) = line.strip_prefix(NAMESPACE_TAG) {
                let status = status.trim_start();
                if status.get(..2).is_some_and(|s| s.eq_ignore_ascii_case("OK")) {
                    break;
                }
                return Err(Error::Protocol(format!("NAMESPACE failed: {status}")));
            }
            if line.starts_with("* NAMESPACE ") {
                reply = Some(line);
            }
        }
        reply.ok_or_else(|| Error::Protocol("Server sent no NAMESPACE data".into()))
    }
}

/// Read one CRLF-terminated line, without the terminator.
async fn read_line<R: futures::AsyncRead + Unpin>(stream: &mut R) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while !line.ends_with(b"\r\n") {
        if stream.read(&mut byte).await? == 0 {
            return Err(Error::Connection("Connection closed mid-response".into()));
        }
        if line.len() >= MAX_LINE {
            return Err(Error::Protocol("Response line too long".into()));
        }
        line.push(byte[0]);
    }
    line.truncate(line.len() - 2);
    Ok(String::from_utf8_lossy(&line).into_owned())
}

/// The first personal namespace of a `* NAMESPACE` line, or `None`
/// when the server reports `NIL`.
fn parse_personal_namespace(line: &str) -> Result<Option<Namespace>> {
    let malformed = || Error::Protocol(format!("Malformed NAMESPACE reply: {line}"));
    let rest = line.strip_prefix("* NAMESPACE ").ok_or_else(malformed)?;
    if starts_with_nil(rest) {
        return Ok(None);
    }

    let rest = rest.strip_prefix("((").ok_or_else(malformed)?;
    let (prefix, rest) = unquote(rest).ok_or_else(malformed)?;
    let rest = rest.trim_start();
    let delimiter = if starts_with_nil(rest) {
        None
    } else {
        Some(unquote(rest).ok_or_else(malformed)?.0)
    };
    Ok(Some(Namespace { prefix, delimiter }))
}

fn starts_with_nil(s: &str) -> bool {
    s.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("NIL"))
}

/// Split a leading IMAP quoted string off `s`, undoing its escapes.
fn unquote(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?.1),
            '"' => return Some((out, &body[i + 1..])),
            _ => out.push(c),
        }
    }
    None
}

fn login_error(e: ImapError) -> Error {
    match e {
        ImapError::No(msg) => Error::Authentication(msg),
        other => imap_error("Login failed", other),
    }
}

fn imap_error(context: &str, e: ImapError) -> Error {
    match e {
        ImapError::Io(io) => Error::Connection(format!("{context}: {io}")),
        other => Error::Protocol(format!("{context}: {other}")),
    }
}

/// Quote `text` as an IMAP string. Line breaks cannot be quoted and
/// become spaces.
fn quote(text: &str) -> String {
    let escaped = text
        .replace(['\r', '\n'], " ")
        .replace('\\', r"\\")
        .replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn flag_from(flag: &ImapFlag<'_>) -> Flag {
    match flag {
        ImapFlag::Seen => Flag::Seen,
        ImapFlag::Answered => Flag::Answered,
        ImapFlag::Flagged => Flag::Flagged,
        ImapFlag::Deleted => Flag::Deleted,
        ImapFlag::Draft => Flag::Draft,
        ImapFlag::Recent => Flag::Keyword("\\Recent".to_string()),
        ImapFlag::Custom(kw) => Flag::Keyword(kw.to_string()),
        other => Flag::Keyword(format!("{other:?}")),
    }
}

fn text(bytes: Option<&[u8]>) -> Option<String> {
    bytes.map(|b| String::from_utf8_lossy(b).into_owned())
}

fn raw_summary(fetch: &Fetch) -> Option<RawSummary> {
    let Some(uid) = fetch.uid else {
        warn!("Skipping FETCH response {} without UID", fetch.message);
        return None;
    };

    let mut summary = RawSummary {
        uid,
        flags: fetch.flags().map(|f| flag_from(&f)).collect(),
        internal_date: fetch.internal_date(),
        ..RawSummary::default()
    };

    if let Some(envelope) = fetch.envelope() {
        summary.subject = text(envelope.subject.as_deref());
        summary.date = text(envelope.date.as_deref());
        summary.from = envelope
            .from
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|addr| Address {
                name: text(addr.name.as_deref()),
                mailbox: text(addr.mailbox.as_deref()),
                host: text(addr.host.as_deref()),
            })
            .collect();
    }

    Some(summary)
}
