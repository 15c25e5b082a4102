//! Instance management command implementation.
//!
//! Provides subcommands for:
//! - Listing and inspecting instances
//! - Creating and deleting instances, optionally waiting on the tasks
//! - Listing interfaces and managing attached security groups
//!
//! Create and delete return task IDs. Without `--wait` the IDs are
//! printed as-is; with it the command polls the tasks and renders the
//! produced resource (or, for delete, confirms the instance is gone).

use std::io::Write;
use std::time::Duration;

use nimbus_api::instances::{
    self, CreateInstanceOpts, CreateInterfaceOpts, CreateVolumeOpts, FloatingIpOpts, Instance,
    InterfaceType, ItemId, ListInstancesParams, VolumeType,
};
use nimbus_api::{tasks, ApiClient, TaskId};

use crate::cli::{
    CreateArgs, DeleteArgs, InstanceCommands, InterfaceCommands, SecurityGroupCommands, WaitArgs,
};
use crate::error::CliError;
use crate::flags;
use crate::output::{InstanceList, InterfaceList, Message, OutputFormat, SecurityGroupList};
use crate::waiter::{
    interruptible, DeleteConfirmation, ResolveFailure, TaskResultResolver, TaskWaiter, WaitError,
};

/// Instance command executor.
pub struct InstanceCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> InstanceCommand<'a> {
    /// Create a new instance command.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Execute an instance subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the operation fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &InstanceCommands,
    ) -> Result<(), CliError> {
        match command {
            InstanceCommands::List {
                exclude_security_group,
                available_floating,
            } => {
                let params = ListInstancesParams {
                    exclude_security_group: exclude_security_group.clone(),
                    available_floating: *available_floating,
                };
                let instances = instances::list(self.client, &params).await?;
                format.write(writer, &InstanceList { instances })?;
            }
            InstanceCommands::Show { id } => {
                let instance = instances::get(self.client, id).await?;
                format.write(writer, &instance)?;
            }
            InstanceCommands::Create(args) => {
                self.create(writer, format, args).await?;
            }
            InstanceCommands::Delete(args) => {
                self.delete(writer, format, args).await?;
            }
            InstanceCommands::Interface {
                command: InterfaceCommands::List { instance_id },
            } => {
                let interfaces = instances::list_interfaces(self.client, instance_id).await?;
                format.write(writer, &InterfaceList { interfaces })?;
            }
            InstanceCommands::Securitygroup { command } => {
                self.security_group(writer, format, command).await?;
            }
        }
        Ok(())
    }

    async fn create<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &CreateArgs,
    ) -> Result<(), CliError> {
        let opts = build_create_opts(args)?;
        opts.validate()?;
        let task_list = instances::create(self.client, &opts).await?;

        if !args.wait.wait {
            format.write(writer, &task_list)?;
            return Ok(());
        }

        let waiter = waiter_for(self.client, &args.wait);
        let resolver = CreatedInstanceResolver {
            client: self.client,
        };
        let report = interruptible(waiter.wait_all(&task_list.tasks, &resolver)).await?;
        for instance in &report.results {
            format.write(writer, instance)?;
        }
        finish_report(report.failures)
    }

    async fn delete<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &DeleteArgs,
    ) -> Result<(), CliError> {
        let opts = build_delete_opts(args);
        opts.validate()?;
        let task_list = instances::delete(self.client, &args.instance_id, &opts).await?;

        if !args.wait.wait {
            format.write(writer, &task_list)?;
            return Ok(());
        }

        let waiter = waiter_for(self.client, &args.wait);
        let resolver = DeleteConfirmation::new(
            InstanceFetchResolver {
                client: self.client,
                instance_id: args.instance_id.clone(),
            },
            &args.instance_id,
        );
        let report = interruptible(waiter.wait_all(&task_list.tasks, &resolver)).await?;
        if report.failures.is_empty() {
            let msg = Message::success(format!("Instance {} deleted", args.instance_id));
            format.write(writer, &msg)?;
        }
        finish_report(report.failures)
    }

    async fn security_group<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &SecurityGroupCommands,
    ) -> Result<(), CliError> {
        match command {
            SecurityGroupCommands::List { instance_id } => {
                let security_groups =
                    instances::list_security_groups(self.client, instance_id).await?;
                format.write(writer, &SecurityGroupList { security_groups })?;
            }
            SecurityGroupCommands::Add { instance_id, name } => {
                instances::assign_security_group(self.client, instance_id, name).await?;
                let msg = Message::success(format!(
                    "Security group {name} attached to instance {instance_id}"
                ));
                format.write(writer, &msg)?;
            }
            SecurityGroupCommands::Delete { instance_id, name } => {
                instances::unassign_security_group(self.client, instance_id, name).await?;
                let msg = Message::success(format!(
                    "Security group {name} detached from instance {instance_id}"
                ));
                format.write(writer, &msg)?;
            }
        }
        Ok(())
    }
}

fn waiter_for<'a>(client: &'a ApiClient, wait: &WaitArgs) -> TaskWaiter<'a, ApiClient> {
    TaskWaiter::new(
        client,
        Duration::from_secs(wait.timeout),
        Duration::from_secs(wait.poll_interval),
    )
}

fn finish_report(mut failures: Vec<WaitError>) -> Result<(), CliError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.remove(0).into())
    }
}

/// Resolver for instance create: look up the instance the task produced.
struct CreatedInstanceResolver<'a> {
    client: &'a ApiClient,
}

impl TaskResultResolver for CreatedInstanceResolver<'_> {
    type Output = Instance;

    async fn resolve(&self, task: &TaskId) -> Result<Instance, ResolveFailure> {
        let info = tasks::get(self.client, task).await?;
        let instance_id = info
            .first_instance_id()
            .ok_or_else(|| format!("task {task} recorded no created instance"))?;
        Ok(instances::get(self.client, instance_id).await?)
    }
}

/// Resolver fetching a fixed instance; wrapped in [`DeleteConfirmation`]
/// so a not-found fetch is the success outcome.
struct InstanceFetchResolver<'a> {
    client: &'a ApiClient,
    instance_id: String,
}

impl TaskResultResolver for InstanceFetchResolver<'_> {
    type Output = Instance;

    async fn resolve(&self, _task: &TaskId) -> Result<Instance, ResolveFailure> {
        Ok(instances::get(self.client, &self.instance_id).await?)
    }
}

/// Zip the parallel volume and interface flag sequences into a create
/// request. `--volume-source` drives the volume count and
/// `--interface-type` the interface count; shorter auxiliary sequences
/// fall back to their defaults at missing indices.
pub fn build_create_opts(args: &CreateArgs) -> Result<CreateInstanceOpts, CliError> {
    let volumes = args
        .volume_sources
        .iter()
        .enumerate()
        .map(|(idx, source)| CreateVolumeOpts {
            source: *source,
            boot_index: flags::at_or(&args.volume_boot_indexes, idx, 0),
            size: flags::at_or(&args.volume_sizes, idx, 0),
            type_name: flags::at_or(&args.volume_types, idx, VolumeType::default()),
            name: flags::string_at(&args.volume_names, idx),
            image_id: flags::string_at(&args.volume_image_ids, idx),
            snapshot_id: flags::string_at(&args.volume_snapshot_ids, idx),
            volume_id: flags::string_at(&args.volume_volume_ids, idx),
        })
        .collect();

    let interfaces = args
        .interface_types
        .iter()
        .enumerate()
        .map(|(idx, interface_type)| {
            // Floating IPs only attach to subnet interfaces; a source
            // supplied at any other index is ignored.
            let floating_ip = if *interface_type == InterfaceType::Subnet {
                flags::at(&args.interface_floating_sources, idx).map(|source| FloatingIpOpts {
                    source,
                    existing_floating_id: flags::string_at(&args.interface_floating_ips, idx),
                })
            } else {
                None
            };
            CreateInterfaceOpts {
                interface_type: *interface_type,
                network_id: flags::string_at(&args.interface_network_ids, idx),
                subnet_id: flags::string_at(&args.interface_subnet_ids, idx),
                floating_ip,
            }
        })
        .collect();

    Ok(CreateInstanceOpts {
        flavor: args.flavor.clone(),
        names: args.names.clone(),
        name_templates: args.name_templates.clone(),
        volumes,
        interfaces,
        security_groups: args
            .security_groups
            .iter()
            .map(|name| ItemId { id: name.clone() })
            .collect(),
        keypair_name: args.keypair.clone().unwrap_or_default(),
        password: args.password.clone().unwrap_or_default(),
        username: args.username.clone().unwrap_or_default(),
        user_data: flags::user_data(args.user_data.as_deref(), args.user_data_file.as_deref())?,
        metadata: flags::parse_metadata(&args.metadata)?,
    })
}

/// Map delete flags onto delete options.
#[must_use]
pub fn build_delete_opts(args: &DeleteArgs) -> instances::DeleteInstanceOpts {
    instances::DeleteInstanceOpts {
        volumes: args.volumes.clone(),
        delete_floating_ips: args.delete_floating_ips,
        floating_ips: args.floating_ips.clone(),
    }
}
