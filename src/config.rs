//! Mail server connection configuration

use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "imap.wp.pl";

/// IMAPS port (TLS-on-connect).
pub const DEFAULT_PORT: u16 = 993;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How TLS is negotiated with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// TLS handshake immediately after the TCP connect (IMAPS).
    #[default]
    Implicit,
    /// Plain connect, then upgrade with `STARTTLS`.
    StartTls,
}

impl FromStr for TlsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "implicit" | "tls" | "ssl" => Ok(Self::Implicit),
            "starttls" => Ok(Self::StartTls),
            other => Err(Error::Config(format!("Invalid TLS mode: {other}"))),
        }
    }
}

/// Where and how to reach the mailbox server.
///
/// Credentials are deliberately absent: they are supplied per call.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    /// Skip certificate verification (self-signed or test servers).
    pub accept_invalid_certs: bool,
    pub connect_timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: TlsMode::Implicit,
            accept_invalid_certs: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl MailConfig {
    /// Load the connection target from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `MAIL_HOST` (default: `imap.wp.pl`)
    /// - `MAIL_PORT` (default: `993`)
    /// - `MAIL_TLS` (`implicit` or `starttls`, default: `implicit`)
    /// - `MAIL_ACCEPT_INVALID_CERTS` (default: `false`)
    /// - `MAIL_CONNECT_TIMEOUT_SECS` (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            host: env::var("MAIL_HOST").unwrap_or(defaults.host),
            port: match env::var("MAIL_PORT") {
                Ok(v) => v
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid MAIL_PORT: {e}")))?,
                Err(_) => defaults.port,
            },
            tls: match env::var("MAIL_TLS") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.tls,
            },
            accept_invalid_certs: match env::var("MAIL_ACCEPT_INVALID_CERTS") {
                Ok(v) => v.parse().map_err(|e| {
                    Error::Config(format!("Invalid MAIL_ACCEPT_INVALID_CERTS: {e}"))
                })?,
                Err(_) => defaults.accept_invalid_certs,
            },
            connect_timeout: match env::var("MAIL_CONNECT_TIMEOUT_SECS") {
                Ok(v) => Duration::from_secs(v.parse().map_err(|e| {
                    Error::Config(format!("Invalid MAIL_CONNECT_TIMEOUT_SECS: {e}"))
                })?),
                Err(_) => defaults.connect_timeout,
            },
        })
    }

    pub(crate) fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
