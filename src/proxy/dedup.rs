//! First-seen-order deduplication of candidate addresses

use std::collections::HashSet;

/// Remove duplicates by exact string equality, keeping the first occurrence
pub fn remove_duplicates(proxies: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(proxies.len());
    proxies
        .into_iter()
        .filter(|proxy| seen.insert(proxy.clone()))
        .collect()
}
