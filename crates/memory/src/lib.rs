//! Memory Store: long-term, per-user conversational facts.

pub mod store;

pub use store::MemoryStore;
