//! UID STORE command handler.
//!
//! Modifies `\Seen` and `\Deleted` on messages identified by UID:
//!
//! - `+FLAGS (...)` -- add flags
//! - `-FLAGS (...)` -- remove flags
//! - `FLAGS (...)` -- replace flags
//!
//! Responds with `* N FETCH (UID U FLAGS (...))` per matched message
//! unless `.SILENT` was given, then the tagged OK. UIDs that do not
//! exist are ignored, so the client sees no FETCH line for them.

use super::{Selected, uid_in_set};
use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use imap_codec::imap_types::flag::{Flag, StoreResponse, StoreType};
use imap_codec::imap_types::sequence::SequenceSet;
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Parsed STORE command arguments.
pub struct StoreArgs<'a> {
    pub sequence_set: &'a SequenceSet,
    pub kind: &'a StoreType,
    pub response: &'a StoreResponse,
    pub flags: &'a [Flag<'a>],
}

/// Handle the UID STORE command. Modifies flags on matching emails.
pub async fn handle_uid_store<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    args: &StoreArgs<'_>,
    mailbox: &Mutex<Mailbox>,
    selected: Option<&Selected>,
    stream: &mut BufReader<S>,
) {
    let Some(selected) = selected else {
        let resp = format!("{tag} BAD No folder selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };
    if selected.read_only {
        let resp = format!("{tag} NO [READ-ONLY] Folder opened with EXAMINE\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    }

    let wants_seen = args.flags.iter().any(|f| matches!(f, Flag::Seen));
    let wants_deleted = args.flags.iter().any(|f| matches!(f, Flag::Deleted));

    // Mutate under lock, write after.
    let results = mailbox
        .lock()
        .unwrap()
        .get_folder_mut(&selected.name)
        .map(|folder| {
            let max_uid = folder.emails.iter().map(|e| e.uid).max().unwrap_or(0);
            let mut results = Vec::new();

            for (idx, email) in folder.emails.iter_mut().enumerate() {
                if !uid_in_set(args.sequence_set, email.uid, max_uid) {
                    continue;
                }
                match args.kind {
                    StoreType::Add => {
                        email.seen |= wants_seen;
                        email.deleted |= wants_deleted;
                    }
                    StoreType::Remove => {
                        email.seen &= !wants_seen;
                        email.deleted &= !wants_deleted;
                    }
                    StoreType::Replace => {
                        email.seen = wants_seen;
                        email.deleted = wants_deleted;
                    }
                }

                let mut current = Vec::new();
                if email.seen {
                    current.push("\\Seen");
                }
                if email.deleted {
                    current.push("\\Deleted");
                }
                results.push((idx + 1, email.uid, current.join(" ")));
            }
            results
        });
    let Some(results) = results else {
        let resp = format!("{tag} BAD Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    if !matches!(args.response, StoreResponse::Silent) {
        for (seq, uid, flags) in &results {
            let line = format!("* {seq} FETCH (UID {uid} FLAGS ({flags}))\r\n");
            if write_line(stream, &line).await.is_err() {
                return;
            }
        }
    }

    let resp = format!("{tag} OK STORE completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::testing::{uid_set, written};
    use crate::fake_imap::mailbox::MailboxBuilder;

    fn raw() -> Vec<u8> {
        b"From: a@b.com\r\nSubject: Test\r\n\r\nBody".to_vec()
    }

    fn selected(read_only: bool) -> Selected {
        Selected {
            name: "INBOX".to_string(),
            read_only,
        }
    }

    async fn run_store(
        uid: u32,
        kind: &StoreType,
        flags: &[Flag<'_>],
        mailbox: &Mutex<Mailbox>,
        selected: Option<&Selected>,
    ) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        let seq = uid_set(uid);
        let args = StoreArgs {
            sequence_set: &seq,
            kind,
            response: &StoreResponse::Answer,
            flags,
        };
        handle_uid_store("A1", &args, mailbox, selected, &mut stream).await;
        drop(stream);
        written(client).await
    }

    fn inbox(raw: &[u8], seen: bool) -> Mutex<Mailbox> {
        Mutex::new(
            MailboxBuilder::new()
                .folder("INBOX")
                .email(1, seen, raw)
                .email(2, false, raw)
                .build(),
        )
    }

    #[tokio::test]
    async fn add_seen_flag() {
        let mb = inbox(&raw(), false);

        let output =
            run_store(1, &StoreType::Add, &[Flag::Seen], &mb, Some(&selected(false))).await;

        assert!(output.contains("* 1 FETCH (UID 1 FLAGS (\\Seen))"));
        assert!(output.contains("A1 OK STORE completed"));
        assert!(mb.lock().unwrap().email("INBOX", 1).unwrap().seen);
    }

    #[tokio::test]
    async fn remove_seen_keeps_deleted() {
        let mb = inbox(&raw(), true);
        mb.lock().unwrap().get_folder_mut("INBOX").unwrap().emails[0].deleted = true;

        let _ = run_store(1, &StoreType::Remove, &[Flag::Seen], &mb, Some(&selected(false))).await;

        let locked = mb.lock().unwrap();
        let email = locked.email("INBOX", 1).unwrap();
        assert!(!email.seen);
        assert!(email.deleted);
    }

    #[tokio::test]
    async fn unknown_uid_gets_no_fetch_line() {
        let mb = inbox(&raw(), false);

        let output =
            run_store(9, &StoreType::Add, &[Flag::Deleted], &mb, Some(&selected(false))).await;

        assert_eq!(output, "A1 OK STORE completed\r\n");
    }

    #[tokio::test]
    async fn read_only_folder_refuses_store() {
        let mb = inbox(&raw(), false);

        let output =
            run_store(1, &StoreType::Add, &[Flag::Deleted], &mb, Some(&selected(true))).await;

        assert!(output.starts_with("A1 NO [READ-ONLY]"));
        assert!(!mb.lock().unwrap().email("INBOX", 1).unwrap().deleted);
    }
}
