//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Every record a
//! command can render implements [`TableDisplay`]; the JSON path goes
//! through serde.

use std::io::Write;

use serde::Serialize;

use nimbus_api::instances::{AttachedSecurityGroup, Instance, InstanceInterface};
use nimbus_api::{TaskInfo, TaskList};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// List of instances for display.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceList {
    /// Instances in the project/region.
    pub instances: Vec<Instance>,
}

impl TableDisplay for InstanceList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.instances.is_empty() {
            writeln!(writer, "No instances found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<20}  {:<12}  {:<10}  {:<10}",
            "ID", "NAME", "FLAVOR", "STATUS", "VM STATE"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;

        for instance in &self.instances {
            writeln!(
                writer,
                "{:<36}  {:<20}  {:<12}  {:<10}  {:<10}",
                instance.id,
                truncate(&instance.name, 20),
                truncate(&instance.flavor, 12),
                instance.status,
                instance.vm_state
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} instance(s)", self.instances.len())?;
        Ok(())
    }
}

impl TableDisplay for Instance {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Instance: {}", self.id)?;
        writeln!(writer, "══════════════════════════════════════════════════")?;
        writeln!(writer, "Name:       {}", self.name)?;
        writeln!(writer, "Flavor:     {}", self.flavor)?;
        writeln!(writer, "Status:     {}", self.status)?;
        writeln!(writer, "VM State:   {}", self.vm_state)?;
        if let Some(created) = &self.created_at {
            writeln!(writer, "Created:    {created}")?;
        }
        Ok(())
    }
}

/// List of instance interfaces for display.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceList {
    /// Interfaces attached to the instance.
    pub interfaces: Vec<InstanceInterface>,
}

impl TableDisplay for InterfaceList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.interfaces.is_empty() {
            writeln!(writer, "No interfaces attached")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<36}  {:<16}",
            "PORT", "NETWORK", "IP ADDRESS"
        )?;
        writeln!(writer, "{}", "─".repeat(92))?;

        for interface in &self.interfaces {
            writeln!(
                writer,
                "{:<36}  {:<36}  {:<16}",
                interface.port_id,
                interface.network_id,
                interface.ip_address.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

/// List of attached security groups for display.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityGroupList {
    /// Security groups attached to the instance.
    pub security_groups: Vec<AttachedSecurityGroup>,
}

impl TableDisplay for SecurityGroupList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.security_groups.is_empty() {
            writeln!(writer, "No security groups attached")?;
            return Ok(());
        }
        writeln!(writer, "NAME")?;
        writeln!(writer, "{}", "─".repeat(32))?;
        for group in &self.security_groups {
            writeln!(writer, "{}", group.name)?;
        }
        Ok(())
    }
}

impl TableDisplay for TaskInfo {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Task: {}", self.id)?;
        writeln!(writer, "State:  {}", self.state)?;
        if let Some(error) = &self.error {
            writeln!(writer, "Error:  {error}")?;
        }
        if let Some(resources) = &self.created_resources {
            if !resources.instances.is_empty() {
                writeln!(writer, "Instances: {}", resources.instances.join(", "))?;
            }
            if !resources.volumes.is_empty() {
                writeln!(writer, "Volumes:   {}", resources.volumes.join(", "))?;
            }
            if !resources.floating_ips.is_empty() {
                writeln!(writer, "Floating IPs: {}", resources.floating_ips.join(", "))?;
            }
        }
        Ok(())
    }
}

impl TableDisplay for TaskList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for task in &self.tasks {
            writeln!(writer, "Task {task} submitted")?;
        }
        Ok(())
    }
}

/// Success message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ {}", self.message)?;
        Ok(())
    }
}

/// Truncate a string to a maximum number of characters, never splitting
/// a multibyte character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_api::tasks::{CreatedResources, TaskId, TaskState};

    fn test_instance() -> Instance {
        Instance {
            id: "inst-abc-123".into(),
            name: "web-1".into(),
            flavor: "g1-small".into(),
            status: "ACTIVE".into(),
            vm_state: "running".into(),
            created_at: Some("2026-08-01T12:00:00Z".into()),
        }
    }

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
    }

    #[test]
    fn instance_list_empty() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&InstanceList { instances: vec![] })
            .expect("should format");
        assert!(output.contains("No instances found"));
    }

    #[test]
    fn instance_list_table_output() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&InstanceList {
                instances: vec![test_instance()],
            })
            .expect("should format");
        assert!(output.contains("inst-abc-123"));
        assert!(output.contains("web-1"));
        assert!(output.contains("ACTIVE"));
        assert!(output.contains("Total: 1 instance(s)"));
    }

    #[test]
    fn instance_list_json_output() {
        let fmt = OutputFormat::new(Format::Json);
        let output = fmt
            .to_string(&InstanceList {
                instances: vec![test_instance()],
            })
            .expect("should format");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed["instances"][0]["id"], "inst-abc-123");
        assert_eq!(parsed["instances"][0]["flavor"], "g1-small");
    }

    #[test]
    fn instance_detail_table_output() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&test_instance()).expect("should format");
        assert!(output.contains("Instance: inst-abc-123"));
        assert!(output.contains("Flavor:     g1-small"));
        assert!(output.contains("Created:    2026-08-01T12:00:00Z"));
    }

    #[test]
    fn interface_list_shows_dash_without_ip() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&InterfaceList {
                interfaces: vec![InstanceInterface {
                    port_id: "port-1".into(),
                    network_id: "net-1".into(),
                    ip_address: None,
                }],
            })
            .expect("should format");
        assert!(output.contains("port-1"));
        assert!(output.contains('-'));
    }

    #[test]
    fn security_group_list_empty() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&SecurityGroupList {
                security_groups: vec![],
            })
            .expect("should format");
        assert!(output.contains("No security groups attached"));
    }

    #[test]
    fn task_info_table_output() {
        let info = TaskInfo {
            id: TaskId::from("task-1"),
            state: TaskState::Finished,
            error: None,
            created_resources: Some(CreatedResources {
                instances: vec!["inst-9".into()],
                volumes: vec![],
                floating_ips: vec![],
            }),
        };
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&info).expect("should format");
        assert!(output.contains("Task: task-1"));
        assert!(output.contains("State:  FINISHED"));
        assert!(output.contains("Instances: inst-9"));
    }

    #[test]
    fn failed_task_shows_remote_error() {
        let info = TaskInfo {
            id: TaskId::from("task-2"),
            state: TaskState::Error,
            error: Some("quota exceeded".into()),
            created_resources: None,
        };
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&info).expect("should format");
        assert!(output.contains("Error:  quota exceeded"));
    }

    #[test]
    fn task_list_table_output() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&TaskList {
                tasks: vec![TaskId::from("t-1"), TaskId::from("t-2")],
            })
            .expect("should format");
        assert!(output.contains("Task t-1 submitted"));
        assert!(output.contains("Task t-2 submitted"));
    }

    #[test]
    fn message_success_has_check_mark() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&Message::success("Security group web attached"))
            .expect("should format");
        assert!(output.contains("✓ Security group web attached"));
    }

    #[test]
    fn truncate_behaviour() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
        assert_eq!(truncate("much-too-long-name", 10), "much-to...");
    }

    #[test]
    fn truncate_cuts_multibyte_names_on_char_boundaries() {
        let name = "é".repeat(14);
        assert_eq!(truncate(&name, 10), format!("{}...", "é".repeat(7)));

        // The whole list rendering path survives a multibyte name.
        let mut instance = test_instance();
        instance.name = name;
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt
            .to_string(&InstanceList {
                instances: vec![instance],
            })
            .expect("should format");
        assert!(output.contains("..."));
    }
}
