//! Folder catalog
//!
//! Folders are enumerated fresh on every call under the account's
//! first personal namespace. The order is whatever the server returns.

use crate::client::MailClient;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::transport::{AccessMode, Connector};
use futures::FutureExt;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// A mailbox folder.
///
/// # Examples
///
/// ```
/// use mailbox_client::Folder;
///
/// let folder = Folder::new("Archive/2024", Some("/"));
/// assert_eq!(folder.name, "2024");
/// assert_eq!(folder.path, "Archive/2024");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Folder {
    /// Last segment of the path.
    pub name: String,
    /// Full path, as accepted by folder-scoped operations.
    pub path: String,
    /// Hierarchy delimiter, if the server reported one.
    pub delimiter: Option<String>,
}

impl Folder {
    #[must_use]
    pub fn new(path: &str, delimiter: Option<&str>) -> Self {
        let name = delimiter
            .filter(|d| !d.is_empty())
            .and_then(|d| path.rsplit(d).next())
            .unwrap_or(path);
        Self {
            name: name.to_string(),
            path: path.to_string(),
            delimiter: delimiter.map(str::to_string),
        }
    }

    /// `INBOX` is case-insensitive (RFC 3501).
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.path.eq_ignore_ascii_case("inbox")
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl<C: Connector> MailClient<C> {
    /// List every folder under the account's personal namespace
    ///
    /// # Errors
    ///
    /// Connection and authentication errors, or `Protocol` if the
    /// account exposes no personal namespace.
    pub async fn list_folders(&self, credentials: &Credentials) -> Result<Vec<Folder>> {
        self.sessions()
            .with_session(credentials, AccessMode::ReadOnly, |session| {
                async move {
                    session.open_inbox().await?;
                    let namespace = session.personal_namespace().await?;
                    let folders = session.list_folders(&namespace).await?;
                    info!("Listed {} folders", folders.len());
                    Ok(folders)
                }
                .boxed()
            })
            .await
    }
}
