//! Command Line Interface (CLI) layer for MODISNRT.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that wires the configuration to
//! the production fetch and tool backends.
//!
//! If you are embedding MODISNRT into another application, drive
//! `modisnrt::Pipeline` directly instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
