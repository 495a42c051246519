//! External command execution
//!
//! - `CommandRunner` - Seam between the backends and the operating system
//! - `ProcessRunner` - Semaphore-controlled async child processes

mod runner;

pub use runner::*;
