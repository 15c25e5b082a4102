//! Command-line argument parsing with clap.
//!
//! The derive tree is the declarative command specification: nouns, verbs,
//! flag schemas, enum domains, and help text all live here, and one
//! dispatch in `main` interprets it. Enum-valued flags use the wire enums
//! from `nimbus-api` directly, so an out-of-set value is a parse-time usage
//! error listing the allowed spellings.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nimbus_api::instances::{FloatingIpSource, InterfaceType, VolumeSource, VolumeType};

/// Nimbus cloud command-line client.
#[derive(Parser, Debug, Clone)]
#[command(name = "nimbus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control-plane API URL.
    #[arg(
        long,
        env = "NIMBUS_API_URL",
        default_value = "https://api.nimbus.example"
    )]
    pub api_url: String,

    /// API bearer token.
    #[arg(long, env = "NIMBUS_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Project ID to operate in.
    #[arg(long, env = "NIMBUS_PROJECT", default_value_t = 1)]
    pub project: u32,

    /// Region ID to operate in.
    #[arg(long, env = "NIMBUS_REGION", default_value_t = 1)]
    pub region: u32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Instance management commands.
    Instance {
        /// Instance subcommand to execute.
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Task inspection commands.
    Task {
        /// Task subcommand to execute.
        #[command(subcommand)]
        command: TaskCommands,
    },
}

/// Instance subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum InstanceCommands {
    /// List instances.
    List {
        /// Exclude instances in the named security group.
        #[arg(short = 'e', long)]
        exclude_security_group: Option<String>,

        /// Show only instances able to take a floating IP.
        #[arg(short = 'a', long)]
        available_floating: bool,
    },

    /// Show one instance.
    Show {
        /// Instance ID to inspect.
        id: String,
    },

    /// Create instances.
    Create(CreateArgs),

    /// Delete an instance.
    Delete(DeleteArgs),

    /// Instance interface commands.
    Interface {
        /// Interface subcommand to execute.
        #[command(subcommand)]
        command: InterfaceCommands,
    },

    /// Instance security group commands.
    Securitygroup {
        /// Security group subcommand to execute.
        #[command(subcommand)]
        command: SecurityGroupCommands,
    },
}

/// Instance interface subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum InterfaceCommands {
    /// List interfaces attached to an instance.
    List {
        /// Instance ID.
        instance_id: String,
    },
}

/// Instance security group subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SecurityGroupCommands {
    /// List security groups attached to an instance.
    List {
        /// Instance ID.
        instance_id: String,
    },

    /// Attach a security group to an instance.
    Add {
        /// Instance ID.
        instance_id: String,

        /// Security group name.
        #[arg(short, long)]
        name: String,
    },

    /// Detach a security group from an instance.
    Delete {
        /// Instance ID.
        instance_id: String,

        /// Security group name.
        #[arg(short, long)]
        name: String,
    },
}

/// Task subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommands {
    /// Show one task.
    Show {
        /// Task ID to inspect.
        id: String,
    },
}

/// Waiting behavior for mutating commands that return tasks.
///
/// Exposed identically on every mutating verb.
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Wait for spawned tasks to finish before exiting.
    #[arg(short = 'w', long)]
    pub wait: bool,

    /// Wait deadline in seconds.
    #[arg(long, default_value_t = 3600)]
    pub timeout: u64,

    /// Seconds between task status polls.
    #[arg(long, default_value_t = 5)]
    pub poll_interval: u64,
}

/// Arguments for the instance create command.
///
/// The volume and interface flags are parallel sequences zipped by
/// position: `--volume-source` drives the volume count and
/// `--interface-type` drives the interface count; shorter auxiliary
/// sequences fall back to documented defaults at missing indices.
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Instance flavor, e.g. g1-small.
    #[arg(long)]
    pub flavor: String,

    /// Instance name (repeatable).
    #[arg(short = 'n', long = "name")]
    pub names: Vec<String>,

    /// Instance name template expanded server-side (repeatable).
    #[arg(long = "name-template")]
    pub name_templates: Vec<String>,

    /// SSH keypair name.
    #[arg(short = 'k', long)]
    pub keypair: Option<String>,

    /// Login password.
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Login username.
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Inline user data payload.
    #[arg(long)]
    pub user_data: Option<String>,

    /// File with the user data payload; takes precedence over --user-data.
    #[arg(long)]
    pub user_data_file: Option<PathBuf>,

    /// Volume source (repeatable; drives the volume count).
    #[arg(long = "volume-source", value_enum, required = true)]
    pub volume_sources: Vec<VolumeSource>,

    /// Volume boot index (positional; default 0).
    #[arg(long = "volume-boot-index")]
    pub volume_boot_indexes: Vec<i32>,

    /// Volume size in GiB (positional; default 0).
    #[arg(long = "volume-size")]
    pub volume_sizes: Vec<u64>,

    /// Volume type (positional; default standard).
    #[arg(long = "volume-type", value_enum)]
    pub volume_types: Vec<VolumeType>,

    /// Volume name (positional).
    #[arg(long = "volume-name")]
    pub volume_names: Vec<String>,

    /// Volume source image ID (positional).
    #[arg(long = "volume-image-id")]
    pub volume_image_ids: Vec<String>,

    /// Volume source snapshot ID (positional).
    #[arg(long = "volume-snapshot-id")]
    pub volume_snapshot_ids: Vec<String>,

    /// Existing volume ID to attach (positional).
    #[arg(long = "volume-volume-id")]
    pub volume_volume_ids: Vec<String>,

    /// Interface type (repeatable; drives the interface count).
    #[arg(long = "interface-type", value_enum, required = true)]
    pub interface_types: Vec<InterfaceType>,

    /// Interface network ID (positional).
    #[arg(long = "interface-network-id")]
    pub interface_network_ids: Vec<String>,

    /// Floating IP source for subnet interfaces (positional).
    #[arg(long = "interface-floating-source", value_enum)]
    pub interface_floating_sources: Vec<FloatingIpSource>,

    /// Existing floating IP to attach (positional).
    #[arg(long = "interface-floating-ip")]
    pub interface_floating_ips: Vec<String>,

    /// Interface subnet ID (positional).
    #[arg(long = "interface-subnet-id")]
    pub interface_subnet_ids: Vec<String>,

    /// Security group to attach (repeatable).
    #[arg(long = "security-group")]
    pub security_groups: Vec<String>,

    /// Metadata tag (repeatable).
    #[arg(long = "metadata", value_name = "KEY=VALUE")]
    pub metadata: Vec<String>,

    /// Waiting behavior.
    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Arguments for the instance delete command.
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Instance ID to delete.
    pub instance_id: String,

    /// Volume to delete together with the instance (repeatable).
    #[arg(long = "volume-id")]
    pub volumes: Vec<String>,

    /// Floating IP to delete together with the instance (repeatable).
    #[arg(long = "floating-ip")]
    pub floating_ips: Vec<String>,

    /// Delete every floating IP attached to the instance.
    #[arg(long)]
    pub delete_floating_ips: bool,

    /// Waiting behavior.
    #[command(flatten)]
    pub wait: WaitArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_help_does_not_panic() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_instance_list() {
        let cli = Cli::parse_from(["nimbus", "instance", "list"]);
        assert_eq!(cli.api_url, "https://api.nimbus.example");
        assert_eq!(cli.format, Format::Table);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::List {
                    exclude_security_group,
                    available_floating,
                },
            } => {
                assert!(exclude_security_group.is_none());
                assert!(!available_floating);
            }
            _ => panic!("expected instance list command"),
        }
    }

    #[test]
    fn parse_instance_list_with_filters() {
        let cli = Cli::parse_from([
            "nimbus", "instance", "list", "-e", "default", "--available-floating",
        ]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::List {
                    exclude_security_group,
                    available_floating,
                },
            } => {
                assert_eq!(exclude_security_group.as_deref(), Some("default"));
                assert!(available_floating);
            }
            _ => panic!("expected instance list command"),
        }
    }

    #[test]
    fn parse_instance_show() {
        let cli = Cli::parse_from(["nimbus", "instance", "show", "inst-1"]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::Show { id },
            } => assert_eq!(id, "inst-1"),
            _ => panic!("expected instance show command"),
        }
    }

    #[test]
    fn parse_respects_format_flag() {
        let cli = Cli::parse_from(["nimbus", "--format", "json", "instance", "list"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn parse_connection_flags() {
        let cli = Cli::parse_from([
            "nimbus",
            "--api-url",
            "https://staging.nimbus.example",
            "--token",
            "tok",
            "--project",
            "7",
            "--region",
            "2",
            "instance",
            "list",
        ]);
        assert_eq!(cli.api_url, "https://staging.nimbus.example");
        assert_eq!(cli.token, "tok");
        assert_eq!(cli.project, 7);
        assert_eq!(cli.region, 2);
    }

    #[test]
    fn parse_create_minimal() {
        let cli = Cli::parse_from([
            "nimbus",
            "instance",
            "create",
            "--flavor",
            "g1-small",
            "--volume-source",
            "new-volume",
            "--interface-type",
            "external",
        ]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::Create(args),
            } => {
                assert_eq!(args.flavor, "g1-small");
                assert_eq!(args.volume_sources, vec![VolumeSource::NewVolume]);
                assert_eq!(args.interface_types, vec![InterfaceType::External]);
                assert!(!args.wait.wait);
                assert_eq!(args.wait.timeout, 3600);
                assert_eq!(args.wait.poll_interval, 5);
            }
            _ => panic!("expected instance create command"),
        }
    }

    #[test]
    fn parse_create_with_repeated_volume_flags() {
        let cli = Cli::parse_from([
            "nimbus",
            "instance",
            "create",
            "--flavor",
            "g1-small",
            "--volume-source",
            "image",
            "--volume-source",
            "new-volume",
            "--volume-image-id",
            "img-1",
            "--volume-size",
            "5",
            "--volume-size",
            "20",
            "--interface-type",
            "external",
        ]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::Create(args),
            } => {
                assert_eq!(
                    args.volume_sources,
                    vec![VolumeSource::Image, VolumeSource::NewVolume]
                );
                assert_eq!(args.volume_image_ids, vec!["img-1"]);
                assert_eq!(args.volume_sizes, vec![5, 20]);
            }
            _ => panic!("expected instance create command"),
        }
    }

    #[test]
    fn create_requires_volume_source() {
        let result = Cli::try_parse_from([
            "nimbus",
            "instance",
            "create",
            "--flavor",
            "g1-small",
            "--interface-type",
            "external",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_enum_value_is_a_usage_error() {
        let result = Cli::try_parse_from([
            "nimbus",
            "instance",
            "create",
            "--flavor",
            "g1-small",
            "--volume-source",
            "warp-drive",
            "--interface-type",
            "external",
        ]);
        let err = result.expect_err("should reject unknown enum value");
        let text = err.to_string();
        assert!(text.contains("warp-drive"));
        // clap advertises the closed set in the usage error
        assert!(text.contains("new-volume"));
    }

    #[test]
    fn parse_create_with_wait_flags() {
        let cli = Cli::parse_from([
            "nimbus",
            "instance",
            "create",
            "--flavor",
            "g1-small",
            "--volume-source",
            "new-volume",
            "--interface-type",
            "external",
            "--wait",
            "--timeout",
            "120",
            "--poll-interval",
            "2",
        ]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::Create(args),
            } => {
                assert!(args.wait.wait);
                assert_eq!(args.wait.timeout, 120);
                assert_eq!(args.wait.poll_interval, 2);
            }
            _ => panic!("expected instance create command"),
        }
    }

    #[test]
    fn parse_delete_with_wait_flags() {
        let cli = Cli::parse_from([
            "nimbus", "instance", "delete", "inst-9", "--wait", "--volume-id", "vol-1",
        ]);
        match cli.command {
            Commands::Instance {
                command: InstanceCommands::Delete(args),
            } => {
                assert_eq!(args.instance_id, "inst-9");
                assert_eq!(args.volumes, vec!["vol-1"]);
                assert!(args.wait.wait);
            }
            _ => panic!("expected instance delete command"),
        }
    }

    #[test]
    fn parse_interface_list() {
        let cli = Cli::parse_from(["nimbus", "instance", "interface", "list", "inst-1"]);
        match cli.command {
            Commands::Instance {
                command:
                    InstanceCommands::Interface {
                        command: InterfaceCommands::List { instance_id },
                    },
            } => assert_eq!(instance_id, "inst-1"),
            _ => panic!("expected interface list command"),
        }
    }

    #[test]
    fn parse_securitygroup_add() {
        let cli = Cli::parse_from([
            "nimbus",
            "instance",
            "securitygroup",
            "add",
            "inst-1",
            "--name",
            "web",
        ]);
        match cli.command {
            Commands::Instance {
                command:
                    InstanceCommands::Securitygroup {
                        command: SecurityGroupCommands::Add { instance_id, name },
                    },
            } => {
                assert_eq!(instance_id, "inst-1");
                assert_eq!(name, "web");
            }
            _ => panic!("expected securitygroup add command"),
        }
    }

    #[test]
    fn parse_task_show() {
        let cli = Cli::parse_from(["nimbus", "task", "show", "task-42"]);
        match cli.command {
            Commands::Task {
                command: TaskCommands::Show { id },
            } => assert_eq!(id, "task-42"),
            _ => panic!("expected task show command"),
        }
    }

    #[test]
    fn format_default_is_table() {
        assert_eq!(Format::default(), Format::Table);
    }
}
