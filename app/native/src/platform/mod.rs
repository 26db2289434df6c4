//! Platform backends.
//!
//! - [`memory`] - In-process window manager used by the demo panel and tests
//! - [`session`] - Session services that run configured shell commands

pub mod memory;
pub mod session;

pub use memory::InMemoryWindowManager;
pub use session::CommandSessionServices;
