//! Batch automation flows.
//!
//! Each flow serializes its API calls through one [`RequestExecutor`], so
//! quota exhaustion anywhere in a batch becomes a wait, not a failure.
//! Per-item failures abort that item only: batch aggregation is explicitly
//! best-effort, and protected accounts are treated as absent data rather
//! than errors.

use tracing::{debug, info, warn};

use crate::{
    analysis::aggregate,
    client::ApiTransport,
    error::Result,
    executor::RequestExecutor,
    policy::retweet_candidates,
    types::Account,
};

/// Build a ranked vocabulary from the profile descriptions of an account's
/// followers.
///
/// Inspects at most `limit` followers. Protected accounts are skipped
/// silently; accounts that fail to load are skipped with a warning.
pub async fn follower_vocabulary<T: ApiTransport>(
    transport: &T,
    executor: &RequestExecutor,
    screen_name: &str,
    limit: usize,
) -> Result<Vec<(String, u64)>> {
    let page = executor
        .execute("follower_ids", || transport.follower_ids(screen_name))
        .await?;

    let mut descriptions = Vec::new();
    for id in page.ids.into_iter().take(limit) {
        match executor.execute("show_user", || transport.show_user(id)).await {
            Ok(account) if account.protected => {
                debug!(id, "skipping protected account");
            }
            Ok(account) => {
                if let Some(description) = account.description {
                    descriptions.push(description);
                }
            }
            Err(e) => warn!(id, error = %e, "skipping account"),
        }
    }

    info!(
        followers = descriptions.len(),
        "aggregating follower descriptions"
    );
    Ok(aggregate(&descriptions))
}

/// Retweet the most recent status of the best-followed admissible friends.
///
/// Shortlists the first `shortlist` friends, selects up to `winners` via
/// [`retweet_candidates`], and retweets each winner's most recent status.
/// Returns the IDs of the statuses retweeted.
pub async fn retweet_top_friends<T: ApiTransport>(
    transport: &T,
    executor: &RequestExecutor,
    screen_name: &str,
    shortlist: usize,
    winners: usize,
) -> Result<Vec<u64>> {
    let page = executor
        .execute("friend_ids", || transport.friend_ids(screen_name))
        .await?;

    let mut accounts: Vec<Account> = Vec::new();
    for id in page.ids.into_iter().take(shortlist) {
        match executor.execute("show_user", || transport.show_user(id)).await {
            Ok(account) if account.protected => {
                debug!(id, "skipping protected account");
            }
            Ok(account) => accounts.push(account),
            Err(e) => warn!(id, error = %e, "skipping account"),
        }
    }

    let mut retweeted = Vec::new();
    for account in retweet_candidates(accounts, shortlist, winners) {
        // Candidates are guaranteed a present, non-reply status.
        let Some(status) = account.most_recent_status else {
            continue;
        };

        match executor.execute("retweet", || transport.retweet(status.id)).await {
            Ok(_) => {
                info!(status_id = status.id, author = %account.screen_name, "retweeted");
                retweeted.push(status.id);
            }
            Err(e) => warn!(status_id = status.id, error = %e, "retweet failed, skipping"),
        }
    }

    Ok(retweeted)
}

/// Reply to each of the most recent mentions with a fixed text, addressed
/// to the mention's author. Returns the number of replies posted.
pub async fn reply_to_mentions<T: ApiTransport>(
    transport: &T,
    executor: &RequestExecutor,
    reply_text: &str,
    limit: u32,
) -> Result<u32> {
    let mentions = executor
        .execute("mentions_timeline", || transport.mentions_timeline(limit))
        .await?;

    let mut sent = 0;
    for mention in mentions {
        let Some(author) = mention.author_screen_name() else {
            debug!(status_id = mention.id, "mention without author, skipping");
            continue;
        };

        let text = format!("@{author} {reply_text}");
        match executor
            .execute("update_status", || {
                transport.update_status(&text, Some(mention.id))
            })
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => warn!(status_id = mention.id, error = %e, "reply failed, skipping"),
        }
    }

    Ok(sent)
}
