//! HTTP surface over the Agent Runtime: the Request Coordinator
//! and the admin-style endpoints for sessions, memory, and search settings.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod state;
