//! Mailbox client
//!
//! Every operation opens its own session, does one unit of work and
//! releases it. Nothing is cached or shared between calls, so
//! concurrent calls against the same account see whatever each
//! connection's view of the server is at the time.

use crate::config::MailConfig;
use crate::imap::ImapConnector;
use crate::session::SessionManager;
use crate::transport::Connector;

/// Entry point for all mailbox operations
///
/// The operations live next to their domain types: folders in
/// [`crate::Folder`], summaries in [`crate::MessageSummary`], and so on.
pub struct MailClient<C = ImapConnector> {
    sessions: SessionManager<C>,
}

impl MailClient<ImapConnector> {
    /// Client talking IMAP to the server described by `config`.
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self::with_connector(ImapConnector::new(config))
    }
}

impl<C: Connector> MailClient<C> {
    /// Client over any transport, e.g. an in-memory one in tests.
    #[must_use]
    pub const fn with_connector(connector: C) -> Self {
        Self {
            sessions: SessionManager::new(connector),
        }
    }

    /// Direct session access for callers that need more than the
    /// built-in operations, or the detailed acquisition error.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager<C> {
        &self.sessions
    }
}
