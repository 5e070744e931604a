//! Deployment orchestration: lifecycle, transfers, remote install.

use crate::aws::{self, Ec2Lifecycle, InstanceInfo};
use crate::config::DeployConfig;
use crate::exec::{CommandLine, CommandRunner};
use crate::remote;
use crate::transfer::{self, GroupTransfer};
use crate::types::FileGroup;

/// Stand-in id for planned lifecycle commands, resolved at run time by the
/// describe call.
const INSTANCE_ID_PLACEHOLDER: &str = "<instance-id>";

/// Typed failure for a selection that would deploy nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no file groups selected; pass at least one of bot, model, config")]
pub struct NoGroupsSelected;

/// Options for one deployment run.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// File groups to transfer.
    pub groups: Vec<FileGroup>,
    /// Start the instance before the transfer and stop it afterwards.
    pub manage_instance: bool,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file group to the selection.
    pub fn with_group(mut self, group: FileGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Add several file groups to the selection.
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = FileGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Set the instance lifecycle flag.
    pub fn with_instance_lifecycle(mut self, manage: bool) -> Self {
        self.manage_instance = manage;
        self
    }
}

/// Outcome of a deployment run.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub hostname: String,
    pub synced: Vec<GroupTransfer>,
    pub skipped: Vec<FileGroup>,
    /// Present when the run managed the instance lifecycle.
    pub instance: Option<InstanceInfo>,
}

/// Runs the deployment sequence against a command runner.
#[derive(Debug)]
pub struct Deployer<'a> {
    runner: &'a dyn CommandRunner,
    config: DeployConfig,
}

impl<'a> Deployer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: DeployConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Execute the full sequence: optional start, transfers, remote install,
    /// optional stop.
    ///
    /// An empty group selection is rejected before any external command is
    /// issued. Any failing external command aborts the remaining sequence.
    pub fn execute(&self, options: &DeployOptions) -> anyhow::Result<DeployReport> {
        if options.groups.is_empty() {
            return Err(NoGroupsSelected.into());
        }

        let instance = if options.manage_instance {
            let lifecycle = Ec2Lifecycle::new(self.runner);
            let info = lifecycle.describe_by_name(&self.config.hostname)?;
            tracing::info!(
                "starting instance {} ({})",
                info.instance_id,
                info.architecture
            );
            lifecycle.start_and_wait(&info.instance_id)?;
            Some(info)
        } else {
            None
        };

        // The discovered architecture overrides the configured default.
        let target = instance
            .as_ref()
            .map(|info| info.architecture)
            .unwrap_or(self.config.architecture)
            .build_target();

        let transfers = transfer::run_transfers(self.runner, &self.config, target, &options.groups)?;
        remote::run_install(self.runner, &self.config)?;

        if let Some(info) = &instance {
            tracing::info!("stopping instance {}", info.instance_id);
            Ec2Lifecycle::new(self.runner).stop_and_wait(&info.instance_id)?;
        }

        Ok(DeployReport {
            hostname: self.config.hostname.clone(),
            synced: transfers.synced,
            skipped: transfers.skipped,
            instance,
        })
    }

    /// Command lines the run would issue, without executing anything.
    ///
    /// Lifecycle start/stop target the instance id returned by the describe
    /// call, so a placeholder id stands in for it here; the transfer plan
    /// assumes the configured default architecture.
    pub fn plan(&self, options: &DeployOptions) -> anyhow::Result<Vec<CommandLine>> {
        if options.groups.is_empty() {
            return Err(NoGroupsSelected.into());
        }

        let mut commands = Vec::new();
        if options.manage_instance {
            commands.push(aws::describe_command(&self.config.hostname));
            commands.push(aws::start_command(INSTANCE_ID_PLACEHOLDER));
            commands.push(aws::wait_command(
                "instance-running",
                INSTANCE_ID_PLACEHOLDER,
            ));
        }

        let target = self.config.architecture.build_target();
        for group in FileGroup::ALL {
            if !options.groups.contains(&group) {
                continue;
            }
            for job in transfer::jobs_for_group(&self.config, target, group) {
                commands.push(transfer::rsync_command(&job));
            }
        }
        commands.push(remote::install_command(&self.config));

        if options.manage_instance {
            commands.push(aws::stop_command(INSTANCE_ID_PLACEHOLDER));
            commands.push(aws::wait_command(
                "instance-stopped",
                INSTANCE_ID_PLACEHOLDER,
            ));
        }

        Ok(commands)
    }
}
