//! Task inspection command implementation.

use std::io::Write;

use nimbus_api::{tasks, ApiClient, TaskId};

use crate::cli::TaskCommands;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Task command executor.
pub struct TaskCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> TaskCommand<'a> {
    /// Create a new task command.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Execute a task subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the task lookup fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &TaskCommands,
    ) -> Result<(), CliError> {
        match command {
            TaskCommands::Show { id } => {
                let info = tasks::get(self.client, &TaskId::from(id.as_str())).await?;
                format.write(writer, &info)?;
            }
        }
        Ok(())
    }
}
