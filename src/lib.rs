//! Session-per-operation IMAP mailbox client
//!
//! Lists folders, summarizes and searches the inbox, fetches full
//! messages and deletes them on an IMAP server such as `imap.wp.pl`.
//! Every operation takes the account [`Credentials`], opens its own
//! authenticated session and always releases it, also when the
//! operation fails or its future is dropped.
//!
//! ```no_run
//! use mailbox_client::{Credentials, MailClient, MailConfig};
//!
//! # async fn run() -> mailbox_client::Result<()> {
//! let client = MailClient::new(MailConfig::from_env()?);
//! let creds = Credentials::new("alice@wp.pl", "hunter2");
//! for summary in client.fetch_summaries(&creds, "INBOX").await? {
//!     println!("{} {}", summary.id, summary.subject);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Messages are addressed by UID.

mod client;
mod config;
mod connection;
mod credentials;
mod error;
mod flag;
mod folder;
mod imap;
mod message;
mod search;
mod session;
mod summary;
mod transport;
mod verify;

pub use client::MailClient;
pub use config::{DEFAULT_HOST, DEFAULT_PORT, MailConfig, TlsMode};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use flag::Flag;
pub use folder::Folder;
pub use imap::{ImapConnector, ImapTransport};
pub use message::FullMessage;
pub use session::{INBOX, Session, SessionManager};
pub use summary::MessageSummary;
pub use transport::{
    AccessMode, Address, Connector, FetchRange, Namespace, RawSummary, SearchField, Transport,
};
pub use verify::is_oauth_supported;
