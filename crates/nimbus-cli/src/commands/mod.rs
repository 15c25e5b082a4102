//! CLI command implementations.
//!
//! Each submodule implements one resource noun:
//! - [`instance`] - compute instance management
//! - [`task`] - asynchronous task inspection

pub mod instance;
pub mod task;

pub use instance::InstanceCommand;
pub use task::TaskCommand;
