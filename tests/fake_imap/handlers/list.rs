//! LIST command handler.
//!
//! `LIST "" ""` asks for the hierarchy root and delimiter only. Other
//! patterns support a trailing `*` (prefix match) or an exact name
//! (RFC 3501 Section 6.3.8):
//!
//! ```text
//! * LIST (\HasNoChildren) "/" "INBOX"
//! * LIST (\HasNoChildren) "/" "Sent"
//! A0002 OK LIST completed
//! ```

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

fn matches(pattern: &str, name: &str) -> bool {
    pattern
        .strip_suffix('*')
        .map_or(pattern == name, |prefix| name.starts_with(prefix))
}

/// Handle the LIST command for the unquoted `pattern`.
pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    pattern: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    let delimiter = &mailbox.delimiter;
    if pattern.is_empty() {
        let line = format!("* LIST (\\Noselect) \"{delimiter}\" \"\"\r\n");
        if write_line(stream, &line).await.is_err() {
            return;
        }
    } else {
        for folder in mailbox.folders.iter().filter(|f| matches(pattern, &f.name)) {
            let line = format!(
                "* LIST (\\HasNoChildren) \"{delimiter}\" \"{}\"\r\n",
                folder.name
            );
            if write_line(stream, &line).await.is_err() {
                return;
            }
        }
    }
    let resp = format!("{tag} OK LIST completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::testing::written;
    use crate::fake_imap::mailbox::MailboxBuilder;

    async fn run(tag: &str, pattern: &str, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_list(tag, pattern, mailbox, &mut stream).await;
        drop(stream);
        written(client).await
    }

    #[tokio::test]
    async fn lists_nested_folders() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .folder("Archive/2024")
            .build();

        let output = run("A1", "*", &mailbox).await;

        assert!(output.contains("\"/\" \"INBOX\""));
        assert!(output.contains("\"/\" \"Archive/2024\""));
        assert!(output.ends_with("A1 OK LIST completed\r\n"));
    }

    #[tokio::test]
    async fn prefix_pattern_limits_folders() {
        let mailbox = MailboxBuilder::new()
            .namespace("INBOX.", ".")
            .folder("INBOX")
            .folder("INBOX.Sent")
            .folder("Shared.Team")
            .build();

        let output = run("A2", "INBOX.*", &mailbox).await;

        assert_eq!(
            output,
            "* LIST (\\HasNoChildren) \".\" \"INBOX.Sent\"\r\nA2 OK LIST completed\r\n"
        );
    }

    #[tokio::test]
    async fn root_query_reports_delimiter_only() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run("T1", "", &mailbox).await;

        assert_eq!(
            output,
            "* LIST (\\Noselect) \"/\" \"\"\r\nT1 OK LIST completed\r\n"
        );
    }
}
