// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Term matching for the typo-tolerant fallback.

/// How an indexed term matched a query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    Exact,
    /// The indexed term starts with the query term.
    Prefix,
    /// Within the allowed edit distance.
    Fuzzy(usize),
}

impl TermMatch {
    pub fn weight(&self) -> f64 {
        match self {
            TermMatch::Exact => 1.0,
            TermMatch::Prefix => 0.5,
            TermMatch::Fuzzy(distance) => 0.45 / (*distance).max(1) as f64,
        }
    }
}

/// Allowed edit distance for a query term: `fuzziness · length`, rounded.
pub fn max_distance(term: &str, fuzziness: f64) -> usize {
    (fuzziness * term.chars().count() as f64).round() as usize
}

/// Matches `query` against an indexed `term`.
pub fn match_term(query: &str, term: &str, max: usize) -> Option<TermMatch> {
    if term == query {
        return Some(TermMatch::Exact);
    }
    if term.starts_with(query) {
        return Some(TermMatch::Prefix);
    }
    if max == 0 {
        return None;
    }
    match osa_distance(query, term) {
        d if d <= max => Some(TermMatch::Fuzzy(d)),
        _ => None,
    }
}

/// Optimal string alignment distance: insertions, deletions, substitutions
/// and adjacent transpositions, counted over chars.
pub fn osa_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Three rolling rows: i-2, i-1, i.
    let width = b.len() + 1;
    let mut before: Vec<usize> = vec![0; width];
    let mut previous: Vec<usize> = (0..width).collect();
    let mut current: Vec<usize> = vec![0; width];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (previous[j] + 1).min(current[j - 1] + 1).min(previous[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(before[j - 2] + 1);
            }
            current[j] = best;
        }
        std::mem::swap(&mut before, &mut previous);
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
#[path = "fuzzy_tests.rs"]
mod tests;
