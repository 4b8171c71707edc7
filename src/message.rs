//! Full-message access and deletion
//!
//! Both operations need a read-write session: fetching marks the
//! message `\Seen`, deleting flags it `\Deleted` and expunges.

use crate::client::MailClient;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::session::INBOX;
use crate::transport::{AccessMode, Connector};
use futures::FutureExt;
use tracing::{info, warn};

/// A complete message as stored on the server.
#[derive(Debug)]
pub struct FullMessage {
    pub id: u32,
    /// Raw RFC 822 content, headers and body.
    pub raw: Vec<u8>,
    /// Set when the message was fetched but marking it read failed.
    pub mark_seen_warning: Option<Error>,
}

impl FullMessage {
    /// The raw content as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

impl<C: Connector> MailClient<C> {
    /// Fetch message `id` from the inbox and mark it read
    ///
    /// See [`Self::fetch_full_in`].
    ///
    /// # Errors
    ///
    /// `MessageNotFound` if `id` does not exist, otherwise connection,
    /// authentication and protocol errors.
    pub async fn fetch_full(&self, credentials: &Credentials, id: u32) -> Result<FullMessage> {
        self.fetch_full_in(credentials, INBOX, id).await
    }

    /// Fetch message `id` from `folder` and mark it read
    ///
    /// The content is retrieved first. If setting `\Seen` afterwards
    /// fails, the message is still returned with
    /// [`FullMessage::mark_seen_warning`] set.
    ///
    /// # Errors
    ///
    /// `FolderNotFound`, `MessageNotFound`, or connection,
    /// authentication and protocol errors raised before the content
    /// was obtained.
    pub async fn fetch_full_in(
        &self,
        credentials: &Credentials,
        folder: &str,
        id: u32,
    ) -> Result<FullMessage> {
        let folder = folder.to_string();
        self.sessions()
            .with_session(credentials, AccessMode::ReadWrite, move |session| {
                async move {
                    session.open_folder(&folder).await?;
                    let raw = session
                        .fetch_message(id)
                        .await?
                        .ok_or(Error::MessageNotFound(id))?;

                    let mark_seen_warning = match session.set_flag(id, &Flag::Seen, true).await {
                        Ok(true) => None,
                        Ok(false) => Some(Error::MessageNotFound(id)),
                        Err(e) => Some(e),
                    };
                    if let Some(e) = &mark_seen_warning {
                        warn!("Fetched UID {id} but could not mark it read: {e}");
                    }

                    Ok(FullMessage {
                        id,
                        raw,
                        mark_seen_warning,
                    })
                }
                .boxed()
            })
            .await
    }

    /// Delete message `id` from the inbox
    ///
    /// See [`Self::delete_message_in`].
    ///
    /// # Errors
    ///
    /// `MessageNotFound` if `id` does not exist, otherwise connection,
    /// authentication and protocol errors.
    pub async fn delete_message(&self, credentials: &Credentials, id: u32) -> Result<usize> {
        self.delete_message_in(credentials, INBOX, id).await
    }

    /// Flag message `id` in `folder` as deleted and expunge the folder
    ///
    /// The expunge is folder-wide: every message already flagged
    /// `\Deleted` in `folder` is purged too. Returns how many messages
    /// were removed.
    ///
    /// # Errors
    ///
    /// `FolderNotFound`, `MessageNotFound`, or connection,
    /// authentication and protocol errors.
    pub async fn delete_message_in(
        &self,
        credentials: &Credentials,
        folder: &str,
        id: u32,
    ) -> Result<usize> {
        let folder = folder.to_string();
        self.sessions()
            .with_session(credentials, AccessMode::ReadWrite, move |session| {
                async move {
                    session.open_folder(&folder).await?;
                    if !session.set_flag(id, &Flag::Deleted, true).await? {
                        return Err(Error::MessageNotFound(id));
                    }
                    let purged = session.expunge().await?;
                    info!("Expunged {purged} messages from {folder}");
                    Ok(purged)
                }
                .boxed()
            })
            .await
    }
}
