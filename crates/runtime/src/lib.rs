//! Agent Runtime: the Agent Loop, the Event Stream Encoder,
//! per-session cancellation, and the Long-Running Job Tracker.

pub mod agent_loop;
pub mod cancel;
pub mod encoder;
pub mod job_tracker;

pub use agent_loop::{AgentRuntime, AgentTurnRequest};
pub use cancel::{CancelMap, CancelToken};
pub use encoder::Frame;
pub use job_tracker::JobTracker;
