//! Credential verification and alternate-auth probing

use crate::client::MailClient;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::transport::{AccessMode, Connector};
use tracing::{debug, info, warn};

impl<C: Connector> MailClient<C> {
    /// Open and release a session without doing anything else
    ///
    /// Success means the server accepted the login; a failed logout
    /// afterwards is only logged.
    ///
    /// # Errors
    ///
    /// The acquisition error, unchanged. [`crate::Error::is_authentication`]
    /// tells rejected credentials apart from other failures.
    pub async fn check_credentials(&self, credentials: &Credentials) -> Result<()> {
        let session = self
            .sessions()
            .acquire(credentials, AccessMode::ReadOnly)
            .await?;
        if let Err(e) = session.release().await {
            warn!("Logout after credential check failed: {e}");
        }
        Ok(())
    }

    /// `true` iff the server accepts the credentials.
    ///
    /// Every failure is reported as `false`; use
    /// [`Self::check_credentials`] for the reason.
    pub async fn verify_credentials(&self, credentials: &Credentials) -> bool {
        match self.check_credentials(credentials).await {
            Ok(()) => true,
            Err(e) => {
                info!(user = credentials.username(), "Credential check failed: {e}");
                false
            }
        }
    }
}

/// Whether `email` can sign in through OAuth. Always `false`.
#[must_use]
pub fn is_oauth_supported(email: &str) -> bool {
    let provider = email.rsplit_once('@').map(|(_, domain)| domain);
    debug!(?provider, "OAuth is not supported for any provider");
    false
}
