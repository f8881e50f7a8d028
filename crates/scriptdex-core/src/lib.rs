// Public fallible APIs in this crate share one concrete error contract
// (`ScriptdexError`); per-function `# Errors` boilerplate would restate it.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type"
)]

pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub(crate) mod llm;
pub mod models;
pub mod parse;
pub mod providers;
pub mod query;
pub mod scan;
pub mod snapshot;
pub mod store;
pub mod trie;

pub use client::Scriptdex;
pub use error::{Result, ScriptdexError};
pub use models::{CommandRecord, MatchKind, QueryHit, QueryOutcome};
pub use store::CommandStore;
