//! Free-text search over the inbox
//!
//! One query per field (subject, from, to, body), merged into a
//! de-duplicated UID list, then a single batched summary fetch.
//!
//! Result order is first occurrence across the fields in that order,
//! ascending UID within a field. It is not a relevance ranking and
//! callers should not rely on it staying the same between releases.

use crate::client::MailClient;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::summary::MessageSummary;
use crate::transport::{AccessMode, Connector, FetchRange, SearchField};
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Concatenate `lists` and drop repeated UIDs, keeping the first
/// occurrence.
pub(crate) fn merge_unique<I>(lists: I) -> Vec<u32>
where
    I: IntoIterator<Item = Vec<u32>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|uid| seen.insert(*uid))
        .collect()
}

impl<C: Connector> MailClient<C> {
    /// Search the inbox for `query` in subject, sender, recipients and
    /// body
    ///
    /// A blank query returns an empty list without contacting the
    /// server. If any of the four field searches fails, the whole call
    /// fails; partial results are never returned.
    ///
    /// # Errors
    ///
    /// Connection, authentication and protocol errors.
    pub async fn search(
        &self,
        credentials: &Credentials,
        query: &str,
    ) -> Result<Vec<MessageSummary>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = query.to_string();

        self.sessions()
            .with_session(credentials, AccessMode::ReadOnly, move |session| {
                async move {
                    session.open_inbox().await?;

                    let mut matches = Vec::with_capacity(SearchField::ALL.len());
                    for field in SearchField::ALL {
                        let uids = session.search_field(field, &query).await?;
                        debug!(field = field.as_search_key(), hits = uids.len(), "Field search");
                        matches.push(uids);
                    }

                    let uids = merge_unique(matches);
                    if uids.is_empty() {
                        return Ok(Vec::new());
                    }
                    info!("Found {} messages matching '{}'", uids.len(), query);

                    let mut by_uid: HashMap<u32, MessageSummary> = session
                        .fetch_summaries(&FetchRange::Uids(uids.clone()))
                        .await?
                        .into_iter()
                        .map(|raw| (raw.uid, MessageSummary::from(raw)))
                        .collect();

                    // Messages expunged since the search simply drop out.
                    Ok(uids.iter().filter_map(|uid| by_uid.remove(uid)).collect())
                }
                .boxed()
            })
            .await
    }
}
