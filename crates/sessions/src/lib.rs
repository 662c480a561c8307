//! Session Store: append-only per-tenant event log with
//! token-budgeted trimming and snapshot retrieval.

pub mod store;
pub mod token;
pub mod transcript;

pub use store::SessionStore;
pub use token::{EstimatingTokenCounter, TokenCounter};
pub use transcript::TranscriptWriter;
