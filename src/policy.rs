//! Account selection policy.
//!
//! Pure functions over account snapshots; no I/O, independently testable.

use crate::types::Account;

/// Whether an account qualifies as a retweet candidate.
///
/// An account is admissible when it follows fewer than 1000 accounts and
/// its follower-to-friend ratio exceeds 0.5. An account following nobody
/// has no meaningful ratio and is treated as inadmissible.
#[must_use]
pub fn is_admissible(account: &Account) -> bool {
    if account.friends_count == 0 {
        return false;
    }
    account.friends_count < 1000
        && f64::from(account.followers_count) / f64::from(account.friends_count) > 0.5
}

/// Rank accounts by follower count, descending.
///
/// The sort is stable: equal follower counts keep their input order.
#[must_use]
pub fn rank(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| b.followers_count.cmp(&a.followers_count));
    accounts
}

/// Select the accounts worth retweeting.
///
/// Takes the first `shortlist` candidates, keeps the admissible ones, ranks
/// them, takes the top `winners`, and keeps only accounts whose most recent
/// status is present and is not a reply.
#[must_use]
pub fn retweet_candidates(
    accounts: Vec<Account>,
    shortlist: usize,
    winners: usize,
) -> Vec<Account> {
    let admissible: Vec<Account> = accounts
        .into_iter()
        .take(shortlist)
        .filter(is_admissible)
        .collect();

    rank(admissible)
        .into_iter()
        .take(winners)
        .filter(|a| {
            a.most_recent_status
                .as_ref()
                .is_some_and(|s| !s.is_reply())
        })
        .collect()
}
