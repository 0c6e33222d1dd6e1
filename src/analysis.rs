//! Token frequency aggregation.

use std::collections::HashMap;

/// Build a ranked frequency table over a collection of text snippets.
///
/// Each text is lowercased and split on whitespace runs. Tokens longer than
/// three characters consisting entirely of letters, `#`, or `@` are counted;
/// everything else is dropped. The table is ordered by count descending,
/// with ties broken by first-seen token order so equal counts come out
/// deterministically.
#[must_use]
pub fn aggregate<S: AsRef<str>>(texts: &[S]) -> Vec<(String, u64)> {
    // token -> (first-seen index, count)
    let mut counts: HashMap<String, (usize, u64)> = HashMap::new();
    let mut next_index = 0usize;

    for text in texts {
        for token in text.as_ref().to_lowercase().split_whitespace() {
            if !is_countable(token) {
                continue;
            }
            let entry = counts.entry(token.to_string()).or_insert_with(|| {
                let index = next_index;
                next_index += 1;
                (index, 0)
            });
            entry.1 += 1;
        }
    }

    let mut table: Vec<(String, usize, u64)> = counts
        .into_iter()
        .map(|(token, (index, count))| (token, index, count))
        .collect();
    table.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));

    table
        .into_iter()
        .map(|(token, _, count)| (token, count))
        .collect()
}

/// A token counts when it is longer than three characters and made entirely
/// of letters, `#`, or `@` (the input is already lowercased).
fn is_countable(token: &str) -> bool {
    token.len() > 3
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '#' || c == '@')
}
