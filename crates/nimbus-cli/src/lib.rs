//! # nimbus-cli
//!
//! Nimbus cloud command-line interface.
//!
//! Resource nouns are top-level subcommands with verb subcommands; each
//! verb maps its flags into a typed request from `nimbus-api`, makes one
//! call, and renders the result in the selected output format.
//!
//! Mutating verbs return asynchronous task identifiers. The [`waiter`]
//! module polls each task to a terminal state and resolves the produced
//! resource through a [`waiter::TaskResultResolver`] before rendering.
//!
//! ```text
//! flags ──► request builder ──► API call ──► task waiter ──► renderer
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod flags;
pub mod output;
pub mod waiter;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
pub use waiter::{TaskResultResolver, TaskWaiter, WaitError};
