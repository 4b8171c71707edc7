//! The transport capability the session layer is built on
//!
//! [`Connector`] opens an authenticated connection; [`Transport`] is
//! the set of mailbox commands one connection can run. The IMAP
//! implementation lives in [`crate::imap`]; tests substitute an
//! in-memory one.

use crate::credentials::Credentials;
use crate::error::Result;
use crate::flag::Flag;
use crate::folder::Folder;
use chrono::{DateTime, FixedOffset};
use std::future::Future;

/// Whether a session may mutate the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Inspection only (`EXAMINE`).
    ReadOnly,
    /// Flag changes and expunge allowed (`SELECT`).
    ReadWrite,
}

/// A personal namespace: folder path prefix plus hierarchy delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub delimiter: Option<String>,
}

/// Message field a free-text search is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Subject,
    From,
    To,
    Body,
}

impl SearchField {
    /// Every field, in the order search results are merged.
    pub const ALL: [Self; 4] = [Self::Subject, Self::From, Self::To, Self::Body];

    /// The IMAP `SEARCH` key for this field.
    #[must_use]
    pub const fn as_search_key(self) -> &'static str {
        match self {
            Self::Subject => "SUBJECT",
            Self::From => "FROM",
            Self::To => "TO",
            Self::Body => "BODY",
        }
    }
}

/// Which messages of the open folder a summary fetch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRange {
    /// Every message in the folder.
    All,
    /// Exactly these UIDs (missing ones are skipped by the server).
    Uids(Vec<u32>),
}

/// One envelope address, undecoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub name: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

/// Envelope and flag metadata as the transport reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSummary {
    pub uid: u32,
    pub flags: Vec<Flag>,
    pub subject: Option<String>,
    pub from: Vec<Address>,
    /// The envelope `Date` header, verbatim.
    pub date: Option<String>,
    pub internal_date: Option<DateTime<FixedOffset>>,
}

/// Mailbox commands available on one authenticated connection.
///
/// Message identifiers are UIDs of the currently open folder.
pub trait Transport: Send + Sized + 'static {
    /// Open `path` for subsequent commands.
    fn open_folder(
        &mut self,
        path: &str,
        mode: AccessMode,
    ) -> impl Future<Output = Result<()>> + Send;

    /// The account's first personal namespace.
    fn personal_namespace(&mut self) -> impl Future<Output = Result<Namespace>> + Send;

    /// Every folder below `namespace`, in server order.
    fn list_folders(
        &mut self,
        namespace: &Namespace,
    ) -> impl Future<Output = Result<Vec<Folder>>> + Send;

    fn fetch_summaries(
        &mut self,
        range: &FetchRange,
    ) -> impl Future<Output = Result<Vec<RawSummary>>> + Send;

    /// Raw RFC 822 content of `uid`, without touching its flags.
    /// `None` when the UID does not exist.
    fn fetch_message(&mut self, uid: u32) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// UIDs whose `field` contains `text`.
    fn search_field(
        &mut self,
        field: SearchField,
        text: &str,
    ) -> impl Future<Output = Result<Vec<u32>>> + Send;

    /// Set or clear `flag` on `uid`. Returns `false` when the UID does
    /// not exist.
    fn set_flag(
        &mut self,
        uid: u32,
        flag: &Flag,
        value: bool,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Purge every `\Deleted` message of the open folder. Returns how
    /// many were removed.
    fn expunge(&mut self) -> impl Future<Output = Result<usize>> + Send;

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens authenticated transports.
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Connect and authenticate.
    ///
    /// Fails with `Connection` when the server is unreachable and
    /// `Authentication` when the credentials are rejected.
    fn open(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Transport>> + Send;
}
