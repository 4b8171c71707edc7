//! IMAP message flags
//!
//! System flags have dedicated variants; anything else the server
//! reports (keywords, `\Recent`) is carried as [`Flag::Keyword`].

use std::fmt;

/// A per-message flag maintained by the mailbox server.
///
/// # Examples
///
/// ```
/// use mailbox_client::Flag;
///
/// assert_eq!(Flag::Seen.as_imap_str(), "\\Seen");
/// assert_eq!(Flag::Deleted.store_query(true), "+FLAGS (\\Deleted)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read (`\Seen`).
    Seen,
    /// Message has been answered (`\Answered`).
    Answered,
    /// Message is flagged for attention (`\Flagged`).
    Flagged,
    /// Message is marked for deletion (`\Deleted`).
    Deleted,
    /// Message is a draft (`\Draft`).
    Draft,
    /// A keyword or non-standard flag, kept verbatim.
    Keyword(String),
}

impl Flag {
    /// The IMAP wire representation of this flag.
    #[must_use]
    pub fn as_imap_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Keyword(kw) => kw,
        }
    }

    /// The `STORE` data item that sets (`+FLAGS`) or clears (`-FLAGS`)
    /// this flag.
    #[must_use]
    pub fn store_query(&self, value: bool) -> String {
        let sign = if value { '+' } else { '-' };
        format!("{sign}FLAGS ({})", self.as_imap_str())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}
