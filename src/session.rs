//! Session acquisition and guaranteed release
//!
//! A [`Session`] wraps one authenticated transport. It is released
//! exactly once: explicitly through [`Session::release`], or, if the
//! owning future is dropped first, by its `Drop` impl which logs out
//! in the background.

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::Folder;
use crate::transport::{
    AccessMode, Connector, FetchRange, Namespace, RawSummary, SearchField, Transport,
};
use futures::future::BoxFuture;
use tracing::{debug, warn};

/// Name of the default folder.
pub const INBOX: &str = "INBOX";

/// Opens sessions for a credential pair.
pub struct SessionManager<C> {
    connector: C,
}

impl<C: Connector> SessionManager<C> {
    #[must_use]
    pub const fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Open an authenticated session.
    ///
    /// # Errors
    ///
    /// `Connection` if the server cannot be reached, `Authentication`
    /// if the credentials are rejected, `Protocol` otherwise.
    pub async fn acquire(
        &self,
        credentials: &Credentials,
        mode: AccessMode,
    ) -> Result<Session<C::Transport>> {
        debug!(user = credentials.username(), ?mode, "Acquiring session");
        let transport = self.connector.open(credentials).await?;
        Ok(Session {
            transport: Some(transport),
            mode,
        })
    }

    /// Run `work` inside a session that is released on every exit
    /// path.
    ///
    /// The work's outcome is returned as-is. A failed logout after the
    /// work finished is logged and does not change that outcome.
    ///
    /// # Errors
    ///
    /// Any acquisition error, or whatever `work` returns.
    pub async fn with_session<R, F>(
        &self,
        credentials: &Credentials,
        mode: AccessMode,
        work: F,
    ) -> Result<R>
    where
        F: for<'s> FnOnce(&'s mut Session<C::Transport>) -> BoxFuture<'s, Result<R>>,
    {
        let mut session = self.acquire(credentials, mode).await?;
        let outcome = work(&mut session).await;
        if let Err(e) = session.release().await {
            warn!("Session release failed: {e}");
        }
        outcome
    }
}

/// A single-use authenticated connection.
pub struct Session<T: Transport> {
    transport: Option<T>,
    mode: AccessMode,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Log out and close the connection.
    ///
    /// # Errors
    ///
    /// Returns the transport's logout error; the connection is closed
    /// either way.
    pub async fn release(mut self) -> Result<()> {
        match self.transport.take() {
            Some(transport) => {
                debug!("Releasing session");
                transport.disconnect().await
            }
            None => Ok(()),
        }
    }

    fn transport(&mut self) -> Result<&mut T> {
        self.transport
            .as_mut()
            .ok_or_else(|| Error::Protocol("Session already released".into()))
    }

    fn writable(&mut self, operation: &str) -> Result<&mut T> {
        if self.mode == AccessMode::ReadOnly {
            return Err(Error::Protocol(format!(
                "{operation} requires a read-write session"
            )));
        }
        self.transport()
    }

    /// Open `path` with the session's access mode.
    ///
    /// # Errors
    ///
    /// `FolderNotFound` if the path does not resolve.
    pub async fn open_folder(&mut self, path: &str) -> Result<()> {
        let mode = self.mode;
        debug!(folder = path, ?mode, "Opening folder");
        self.transport()?.open_folder(path, mode).await
    }

    /// Open the inbox with the session's access mode.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub async fn open_inbox(&mut self) -> Result<()> {
        self.open_folder(INBOX).await
    }

    /// # Errors
    ///
    /// `Protocol` if the account has no personal namespace.
    pub async fn personal_namespace(&mut self) -> Result<Namespace> {
        self.transport()?.personal_namespace().await
    }

    /// # Errors
    ///
    /// Transport errors.
    pub async fn list_folders(&mut self, namespace: &Namespace) -> Result<Vec<Folder>> {
        self.transport()?.list_folders(namespace).await
    }

    /// # Errors
    ///
    /// Transport errors.
    pub async fn fetch_summaries(&mut self, range: &FetchRange) -> Result<Vec<RawSummary>> {
        self.transport()?.fetch_summaries(range).await
    }

    /// # Errors
    ///
    /// Transport errors.
    pub async fn fetch_message(&mut self, uid: u32) -> Result<Option<Vec<u8>>> {
        self.transport()?.fetch_message(uid).await
    }

    /// # Errors
    ///
    /// Transport errors.
    pub async fn search_field(&mut self, field: SearchField, text: &str) -> Result<Vec<u32>> {
        self.transport()?.search_field(field, text).await
    }

    /// Set or clear `flag` on `uid`; `false` if the UID is absent.
    ///
    /// # Errors
    ///
    /// `Protocol` on a read-only session, otherwise transport errors.
    pub async fn set_flag(&mut self, uid: u32, flag: &Flag, value: bool) -> Result<bool> {
        self.writable("STORE")?.set_flag(uid, flag, value).await
    }

    /// Purge every `\Deleted` message of the open folder.
    ///
    /// # Errors
    ///
    /// `Protocol` on a read-only session, otherwise transport errors.
    pub async fn expunge(&mut self) -> Result<usize> {
        self.writable("EXPUNGE")?.expunge().await
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        warn!("Session dropped without release, logging out in background");
        // Without a runtime the transport is dropped here, which closes
        // the socket.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = transport.disconnect().await {
                    debug!("Background logout failed: {e}");
                }
            });
        }
    }
}
