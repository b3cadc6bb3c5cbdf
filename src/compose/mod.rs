//! Turns ranked candidates into the final recommendation list.
//!
//! Steps, in order:
//! 1. Drop repeated and empty URLs
//! 2. Round-robin across test types when more than one type is present
//! 3. Clamp to the 5..=10 window, repeating items when fewer than 5 exist
//! 4. Derive adaptive/remote/duration attributes from the item text

mod attributes;

use std::collections::{HashSet, VecDeque};

use crate::types::{Candidate, Recommendation};

/// Fewest recommendations returned when anything matched at all.
pub const MIN_RESULTS: usize = 5;

/// Most recommendations ever returned.
pub const MAX_RESULTS: usize = 10;

/// Bucket for candidates without a type code during balancing.
const UNKNOWN_TYPE: &str = "Unknown";

/// Requested size clamped to the output window.
pub fn effective_k(k: usize) -> usize {
    k.clamp(MIN_RESULTS, MAX_RESULTS)
}

/// Build the final, ordered recommendation list from ranked candidates.
///
/// Returns between 5 and `effective_k(k)` items whenever at least one
/// candidate has a URL, and nothing otherwise.
pub fn compose(candidates: Vec<Candidate>, k: usize) -> Vec<Recommendation> {
    let k = effective_k(k);

    let unique = dedup_by_url(candidates);
    let balanced = balance_by_type(unique, k);
    let window = enforce_cardinality(balanced, k);

    window.into_iter().map(Recommendation::from).collect()
}

/// Interleave candidates across test types.
///
/// With two or more distinct type codes, candidates are grouped by type in
/// order of first appearance and taken one per group per round until `k`
/// items are collected. Otherwise the first `k` candidates are kept as is.
pub fn balance_by_type(candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    let distinct_types = candidates
        .iter()
        .filter_map(|c| c.test_type.as_deref())
        .filter(|t| !t.is_empty())
        .collect::<HashSet<_>>()
        .len();

    if distinct_types < 2 {
        let mut candidates = candidates;
        candidates.truncate(k);
        return candidates;
    }

    let mut groups: Vec<(String, VecDeque<Candidate>)> = Vec::new();
    for candidate in candidates {
        let key = candidate
            .test_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());

        match groups.iter_mut().find(|(t, _)| *t == key) {
            Some((_, group)) => group.push_back(candidate),
            None => groups.push((key, VecDeque::from([candidate]))),
        }
    }

    let mut balanced = Vec::with_capacity(k);
    while balanced.len() < k && groups.iter().any(|(_, g)| !g.is_empty()) {
        for (_, group) in groups.iter_mut() {
            if let Some(candidate) = group.pop_front() {
                balanced.push(candidate);
                if balanced.len() >= k {
                    break;
                }
            }
        }
    }

    balanced
}

/// Keep the first occurrence of every URL and drop candidates without one.
pub fn dedup_by_url(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| !c.url.is_empty() && seen.insert(c.url.clone()))
        .collect()
}

/// Truncate to `min(k, MAX_RESULTS)`; pad a short, non-empty list up to
/// `MIN_RESULTS` by cycling through it from the front.
pub fn enforce_cardinality(mut items: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    items.truncate(k.min(MAX_RESULTS));

    let distinct = items.len();
    if distinct == 0 {
        return items;
    }

    let mut next = 0;
    while items.len() < MIN_RESULTS {
        items.push(items[next % distinct].clone());
        next += 1;
    }

    items
}
