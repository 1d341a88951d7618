//! Budget-bounded context retrieval.
//!
//! Thin selection layer over a [`ContextStore`]: take the top search
//! hits, cap their number, then walk them in rank order accumulating a
//! whitespace-token count. The first excerpt that would overflow the
//! budget ends the walk; nothing after it is considered, even if it
//! would fit.

use std::sync::Arc;

use tracing::debug;

use super::store::{ContextSearchResult, ContextStore};

/// Parameters of one retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub scope: String,
    pub query: String,
    /// Whitespace-token budget across all selected excerpts.
    pub max_tokens: usize,
    /// Cap on the number of selected excerpts.
    pub max_results: usize,
}

/// Selects which search hits fit into a prompt's context budget.
pub struct ContextRetriever {
    store: Arc<dyn ContextStore>,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }

    /// Searches the scope and selects hits in rank order until the
    /// result cap or the token budget is hit.
    ///
    /// Read-only and idempotent: retrieving twice against an unchanged
    /// store returns the same selection.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Vec<ContextSearchResult> {
        let hits = self.store.search(&request.scope, &request.query).await;
        let candidates = hits.len();

        let mut selected = Vec::new();
        let mut used_tokens = 0usize;
        for hit in hits.into_iter().take(request.max_results) {
            let cost = whitespace_tokens(&hit.excerpt);
            if used_tokens + cost > request.max_tokens {
                break;
            }
            used_tokens += cost;
            selected.push(hit);
        }

        debug!(
            "Context retrieval in '{}': {} candidates, {} selected, {} tokens used",
            request.scope,
            candidates,
            selected.len(),
            used_tokens
        );
        selected
    }
}

/// Whitespace-separated token count. An approximation of prompt cost,
/// not a model tokenizer.
fn whitespace_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}
