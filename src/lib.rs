//! Core task pipeline of the Hearth family assistant.
//!
//! Hearth turns free-form family messages ("Soccer practice moved to
//! Tuesday 5pm, spaghetti for dinner") into typed todo, meal, and event
//! records, and writes periodic household summaries. This crate is the
//! orchestration core: prompt/skill/tool registries, scoped context
//! storage with budgeted retrieval, provider bindings, and the
//! normalizer that turns untrusted model JSON into records the rest of
//! the product can store.
//!
//! The outer product surfaces (HTTP API, messaging webhooks, storage)
//! live elsewhere and call in through [`LlmService`] and
//! [`parse_actionable_items`].

pub mod actions;
pub mod builtin;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod registry;
pub mod service;
pub mod worker;

pub use actions::{parse_actionable_items, ExtractedActions, ExtractionInput, FileAttachment};
pub use config::Config;
pub use error::TaskError;
pub use service::{LlmService, TaskOutcome, TaskRequest};
