//! File-group planning and rsync transfer execution.

use std::path::{Path, PathBuf};

use crate::config::DeployConfig;
use crate::exec::{CommandLine, CommandRunner, run_checked};
use crate::types::{BuildTarget, FileGroup};

/// A single local → remote sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub source: PathBuf,
    /// rsync-style `host:path` destination.
    pub destination: String,
}

impl TransferJob {
    fn to_home(source: PathBuf, hostname: &str) -> Self {
        Self {
            source,
            destination: format!("{hostname}:~/"),
        }
    }
}

/// Transfers performed for one selected group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTransfer {
    pub group: FileGroup,
    pub files: usize,
}

/// Outcome of the transfer phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub synced: Vec<GroupTransfer>,
    pub skipped: Vec<FileGroup>,
}

/// Jobs a group would sync, all destined for the remote home directory.
pub fn jobs_for_group(
    config: &DeployConfig,
    target: BuildTarget,
    group: FileGroup,
) -> Vec<TransferJob> {
    match group {
        FileGroup::Bot => vec![TransferJob::to_home(
            PathBuf::from(format!("target/{target}/release/{}", config.bot_binary)),
            &config.hostname,
        )],
        FileGroup::Model => vec![TransferJob::to_home(
            config.model_path.clone(),
            &config.hostname,
        )],
        FileGroup::Config => config
            .config_files
            .iter()
            .cloned()
            .chain(std::iter::once(config.crontab_file.clone()))
            .map(|path| TransferJob::to_home(path, &config.hostname))
            .collect(),
    }
}

/// One-way, update-if-newer, compressed sync of a single file.
pub fn rsync_command(job: &TransferJob) -> CommandLine {
    CommandLine::new("rsync")
        .arg("-uvz")
        .arg(job.source.display().to_string())
        .arg(job.destination.clone())
}

/// Run the selected groups in deployment order; every unselected group gets
/// a skip notice.
pub fn run_transfers(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
    target: BuildTarget,
    selected: &[FileGroup],
) -> anyhow::Result<TransferReport> {
    let mut report = TransferReport::default();

    for group in FileGroup::ALL {
        if !selected.contains(&group) {
            tracing::info!("skip {group}");
            report.skipped.push(group);
            continue;
        }

        let jobs = jobs_for_group(config, target, group);
        for job in &jobs {
            tracing::info!("rsync {}:", file_label(&job.source));
            run_checked(
                runner,
                &rsync_command(job),
                &format!("rsync of {}", file_label(&job.source)),
            )?;
        }
        report.synced.push(GroupTransfer {
            group,
            files: jobs.len(),
        });
    }

    Ok(report)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
