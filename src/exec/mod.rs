// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `ProcessRunner` trait the scheduler launches
//!   through, the exactly-once `Completion` callback, and `ProcessHandle`.
//! - [`process_runner`] is the production runner built on
//!   `tokio::process::Command`: it streams stdout to the sink, sends stderr
//!   through the diagnostic parser, and completes the run on exit.

pub mod backend;
pub mod process_runner;

pub use backend::{Completion, ProcessHandle, ProcessRunner};
pub use process_runner::{run_command, TokioProcessRunner};
