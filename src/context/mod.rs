//! Household context: scoped document storage, lexical search, and
//! budget-bounded retrieval.
//!
//! Documents live in named scopes (family, user, conversation ids).
//! Search never crosses scopes. The retriever sits on top of the store
//! and enforces a result cap and a token budget so retrieved context
//! cannot blow up prompt size.

pub mod retriever;
pub mod store;

pub use retriever::{ContextRetriever, RetrievalRequest};
pub use store::{ContextDocument, ContextSearchResult, ContextStore, MemoryContextStore};
