//! LOGIN command handler.
//!
//! Credentials are checked against the mailbox. async-imap sends both
//! arguments as quoted strings:
//!
//! ```text
//! A0001 LOGIN "alice@wp.pl" "secret"
//! ```

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the LOGIN command. Returns whether the credentials were
/// accepted.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    line: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    let args = arguments(line);
    let accepted = matches!(
        args.as_slice(),
        [_, _, user, pass] if *user == mailbox.username && *pass == mailbox.password
    );

    let resp = if accepted {
        format!("{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    let _ = write_line(stream, &resp).await;
    accepted
}

/// Split a command line into atoms and unescaped quoted strings.
fn arguments(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = line.trim_end().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == ' ' {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut arg = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => arg.extend(chars.next()),
                    '"' => break,
                    other => arg.push(other),
                }
            }
            args.push(arg);
        } else {
            let mut arg = String::new();
            while let Some(&c) = chars.peek() {
                if c == ' ' {
                    break;
                }
                arg.push(c);
                chars.next();
            }
            args.push(arg);
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::testing::written;
    use crate::fake_imap::mailbox::MailboxBuilder;

    async fn run(line: &str) -> (String, bool) {
        let mailbox = MailboxBuilder::new().credentials("alice", "p\"w").build();
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let ok = handle_login("A0001", line, &mailbox, &mut stream).await;
        drop(stream);
        (written(client).await, ok)
    }

    #[test]
    fn splits_quoted_arguments() {
        assert_eq!(
            arguments("A1 LOGIN \"a b\" \"x\\\"y\"\r\n"),
            vec!["A1", "LOGIN", "a b", "x\"y"]
        );
    }

    #[tokio::test]
    async fn accepts_matching_credentials() {
        let (output, ok) = run("A0001 LOGIN \"alice\" \"p\\\"w\"\r\n").await;
        assert!(ok);
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (output, ok) = run("A0001 LOGIN \"alice\" \"nope\"\r\n").await;
        assert!(!ok);
        assert!(output.starts_with("A0001 NO [AUTHENTICATIONFAILED]"));
    }
}
