//! Context document store with naive lexical search.
//!
//! Scoring is deliberately simple: lowercase tokens split on non-word
//! boundaries, scored by how many distinct query terms a document
//! contains relative to its own length. No stemming, no embeddings, no
//! ranking model. Good enough for short household notes, and fully
//! deterministic.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A short text document in a named scope.
#[derive(Debug, Clone)]
pub struct ContextDocument {
    pub id: String,
    pub scope: String,
    pub text: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ContextDocument {
    /// New document with a fresh id and the current time.
    pub fn new(scope: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scope: scope.into(),
            text: text.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }
}

/// A search hit: the matched document, its relevance score in `(0, 1]`,
/// and the excerpt eligible for prompt injection.
#[derive(Debug, Clone)]
pub struct ContextSearchResult {
    pub document: ContextDocument,
    pub score: f64,
    pub excerpt: String,
}

/// Append-only, scope-partitioned document collection.
///
/// Implementations backed by fallible storage surface failures on their
/// own (log and return nothing); the task pipeline treats retrieval as
/// infallible.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Appends documents to their scopes. Ids are not deduplicated;
    /// two documents sharing an id both remain searchable.
    async fn add_documents(&self, documents: Vec<ContextDocument>);

    /// Searches one scope by lexical overlap with the query.
    ///
    /// Only documents with a positive score are returned, sorted by
    /// score descending. Equal scores keep insertion order.
    async fn search(&self, scope: &str, query: &str) -> Vec<ContextSearchResult>;
}

/// In-memory reference implementation of [`ContextStore`].
#[derive(Default)]
pub struct MemoryContextStore {
    scopes: RwLock<HashMap<String, Vec<ContextDocument>>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn add_documents(&self, documents: Vec<ContextDocument>) {
        // One write lock for the whole batch, so readers never observe
        // a partially appended batch.
        let mut scopes = self.scopes.write().await;
        for doc in documents {
            scopes.entry(doc.scope.clone()).or_default().push(doc);
        }
    }

    async fn search(&self, scope: &str, query: &str) -> Vec<ContextSearchResult> {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() {
            return Vec::new();
        }

        let scopes = self.scopes.read().await;
        let Some(documents) = scopes.get(scope) else {
            return Vec::new();
        };

        let mut results: Vec<ContextSearchResult> = documents
            .iter()
            .filter_map(|doc| {
                let doc_tokens = tokenize(&doc.text);
                let doc_token_set: HashSet<&str> =
                    doc_tokens.iter().map(String::as_str).collect();
                let matched = query_terms
                    .iter()
                    .filter(|term| doc_token_set.contains(term.as_str()))
                    .count();
                let score = matched as f64 / doc_tokens.len().max(1) as f64;
                (score > 0.0).then(|| ContextSearchResult {
                    document: doc.clone(),
                    score,
                    excerpt: doc.text.clone(),
                })
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }
}

/// Lowercase tokens split on non-word-character boundaries.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
