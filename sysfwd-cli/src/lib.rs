//! sysfwd CLI library
//!
//! Command handlers and helpers behind the `sysfwd` binary. Exposed as a
//! library so integration tests can drive commands without spawning processes.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod metrics_server;
pub mod output;
