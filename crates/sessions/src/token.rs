//! Token counting abstraction for trim decisions.
//!
//! The Session Store has no business depending on the capability layer just
//! to count tokens, so it depends on this narrow trait instead. The Agent
//! Runtime wires in an implementation backed by the LLM port (or, lacking
//! one, the estimator below).

use agentrt_domain::event::Event;

pub trait TokenCounter: Send + Sync {
    fn count(&self, events: &[Event]) -> u32;
}

/// Whitespace-based estimator (~4 characters per token), used when no LLM
/// port is available to count tokens exactly.
#[derive(Default)]
pub struct EstimatingTokenCounter;

impl TokenCounter for EstimatingTokenCounter {
    fn count(&self, events: &[Event]) -> u32 {
        let chars: usize = events
            .iter()
            .map(|e| serde_json::to_string(e).map(|s| s.len()).unwrap_or(0))
            .sum();
        (chars / 4) as u32
    }
}
