// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid issue search.
//!
//! A query first runs as an exact word-prefix match; only when that finds
//! nothing does it fall back to the typo-tolerant ranking. Both read one
//! immutable [`IndexSnapshot`], swapped whole on every rebuild, so a query
//! never sees a half-built index.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use ot_core::{Database, Issue, StoreTable};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::sync::SharedStore;

mod fuzzy;

pub use fuzzy::{max_distance, osa_distance, TermMatch};

/// Indexed field of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Key,
    Summary,
    Description,
}

impl Field {
    const ALL: [Field; 3] = [Field::Key, Field::Summary, Field::Description];

    /// Ranking weight in the fuzzy fallback.
    pub fn boost(&self) -> f64 {
        match self {
            Field::Key => 3.0,
            Field::Summary => 2.0,
            Field::Description => 1.0,
        }
    }
}

/// Lowercased words of `text`, split on whitespace with surrounding
/// punctuation trimmed.
pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// The whole key plus its hyphen-separated parts: `abc-12`, `abc`, `12`.
fn key_words(key: &str) -> Vec<String> {
    let mut out = words(key);
    let parts: Vec<String> = out
        .iter()
        .flat_map(|w| w.split('-'))
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    for part in parts {
        if !out.contains(&part) {
            out.push(part);
        }
    }
    out
}

#[derive(Debug, Clone)]
struct Document {
    id: String,
    local_updated: i64,
    fields: [Vec<String>; 3],
}

impl Document {
    fn from_issue(issue: &Issue) -> Self {
        Document {
            id: issue.id.clone(),
            local_updated: issue.local.local_updated,
            fields: [key_words(&issue.key), words(&issue.summary), words(&issue.description_text())],
        }
    }

    fn has_prefix(&self, query: &str) -> bool {
        self.fields.iter().flatten().any(|w| w.starts_with(query))
    }
}

/// An immutable view of the indexed issues.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    docs: Vec<Document>,
    /// term -> (doc index, field) postings
    terms: BTreeMap<String, Vec<(usize, Field)>>,
}

impl IndexSnapshot {
    /// Builds a snapshot. Tombstoned issues are left out.
    pub fn build<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let docs: Vec<Document> =
            issues.into_iter().filter(|i| !i.local.deleted).map(Document::from_issue).collect();

        let mut terms: BTreeMap<String, Vec<(usize, Field)>> = BTreeMap::new();
        for (n, doc) in docs.iter().enumerate() {
            for (field, field_words) in Field::ALL.iter().zip(&doc.fields) {
                for word in field_words {
                    let postings = terms.entry(word.clone()).or_default();
                    if !postings.contains(&(n, *field)) {
                        postings.push((n, *field));
                    }
                }
            }
        }
        IndexSnapshot { docs, terms }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.iter().any(|d| d.id == id)
    }

    /// Issues where every query word prefixes some word, most recently
    /// touched first.
    pub fn exact(&self, query: &str) -> Vec<String> {
        let query = words(query);
        if query.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<&Document> =
            self.docs.iter().filter(|d| query.iter().all(|q| d.has_prefix(q))).collect();
        hits.sort_by(|a, b| b.local_updated.cmp(&a.local_updated).then_with(|| a.id.cmp(&b.id)));
        hits.into_iter().map(|d| d.id.clone()).collect()
    }

    /// Typo-tolerant ranking. Each query word adds, per field, the field
    /// boost times its best term match.
    pub fn fuzzy(&self, query: &str, fuzziness: f64) -> Vec<String> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for q in words(query) {
            let max = max_distance(&q, fuzziness);
            let mut best: HashMap<(usize, Field), f64> = HashMap::new();
            for (term, postings) in &self.terms {
                let Some(matched) = fuzzy::match_term(&q, term, max) else {
                    continue;
                };
                for &(doc, field) in postings {
                    let weight = best.entry((doc, field)).or_insert(0.0);
                    *weight = weight.max(matched.weight());
                }
            }
            for ((doc, field), weight) in best {
                *scores.entry(doc).or_insert(0.0) += field.boost() * weight;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|(a, sa), (b, sb)| {
            sb.total_cmp(sa)
                .then_with(|| self.docs[*b].local_updated.cmp(&self.docs[*a].local_updated))
                .then_with(|| self.docs[*a].id.cmp(&self.docs[*b].id))
        });
        ranked.into_iter().map(|(doc, _)| self.docs[doc].id.clone()).collect()
    }
}

/// The live search index.
pub struct SearchIndex {
    snapshot: RwLock<Arc<IndexSnapshot>>,
    fuzziness: f64,
}

impl SearchIndex {
    pub fn new(fuzziness: f64) -> Self {
        SearchIndex { snapshot: RwLock::new(Arc::new(IndexSnapshot::default())), fuzziness }
    }

    pub fn fuzziness(&self) -> f64 {
        self.fuzziness
    }

    /// The current snapshot. Later rebuilds do not affect it.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replaces the snapshot with one built from `issues`.
    pub fn rebuild<'a>(&self, issues: impl IntoIterator<Item = &'a Issue>) {
        let next = Arc::new(IndexSnapshot::build(issues));
        tracing::debug!(documents = next.len(), "search index rebuilt");
        let mut guard = self.snapshot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
    }

    /// Rebuilds from every live issue in the store.
    pub fn reindex_all(&self, db: &Database) -> ot_core::Result<usize> {
        let issues = db.list_issues()?;
        self.rebuild(&issues);
        Ok(issues.len())
    }

    /// Matching issue ids: the exact set when non-empty, else the fuzzy
    /// ranking.
    pub fn search_ids(&self, query: &str) -> Vec<String> {
        let snapshot = self.snapshot();
        let exact = snapshot.exact(query);
        if !exact.is_empty() {
            return exact;
        }
        snapshot.fuzzy(query, self.fuzziness)
    }

    /// Matching issues as currently stored. Ids the store no longer has,
    /// or has tombstoned, are dropped.
    pub fn search(&self, db: &Database, query: &str) -> ot_core::Result<Vec<Issue>> {
        let mut issues = Vec::new();
        for id in self.search_ids(query) {
            if let Some(issue) = db.find_issue(&id)?.filter(|i| !i.local.deleted) {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    /// Indexes the store now and keeps the index current as issues change,
    /// until `shutdown` fires.
    pub async fn watch(
        self: &Arc<Self>,
        store: SharedStore,
        shutdown: CancellationToken,
    ) -> ot_core::Result<JoinHandle<()>> {
        let mut events = {
            let db = store.lock().await;
            let events = db.subscribe();
            self.reindex_all(&db)?;
            events
        };

        let index = Arc::clone(self);
        Ok(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) if event.table != StoreTable::Issues => continue,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                // One rebuild covers every event already waiting.
                while events.try_recv().is_ok() {}

                let db = store.lock().await;
                if let Err(e) = index.reindex_all(&db) {
                    tracing::warn!("search reindex failed: {}", e);
                }
            }
        }))
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
