//! Media Resolver: turns a user's turn text, attachments, and session
//! history into the concrete, ordered set of media handles the rest of the
//! turn operates on.

pub mod deictic;
pub mod history;
pub mod resolver;

pub use resolver::resolve;
