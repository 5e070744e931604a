//! Skiff - bot deployment tool
//!
//! Usage:
//!   skiff -i bot config            # sync the selected groups and install
//!   skiff -i bot -s                # start the instance, deploy, stop it
//!   skiff -i bot model --dry-run   # print the commands without running them

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skiff_core::config::ConfigStore;
use skiff_core::deploy::{DeployOptions, DeployReport, Deployer};
use skiff_core::exec::SystemRunner;
use skiff_core::types::FileGroup;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Deploy bot builds to a remote host", long_about = None)]
struct Cli {
    /// Remote host, also the EC2 Name tag with --start-stop-instance
    #[arg(short = 'H', long)]
    hostname: Option<String>,

    /// File groups to sync
    #[arg(short, long, value_name = "GROUP", num_args = 0..)]
    include: Vec<GroupArg>,

    /// Local path of the model artifact
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Start the instance before deploying and stop it afterwards
    #[arg(short, long)]
    start_stop_instance: bool,

    /// Config file (defaults to ./skiff.toml, then the user config dir)
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Print the commands a run would issue without executing them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupArg {
    Bot,
    Model,
    Config,
}

impl From<GroupArg> for FileGroup {
    fn from(group: GroupArg) -> Self {
        match group {
            GroupArg::Bot => FileGroup::Bot,
            GroupArg::Model => FileGroup::Model,
            GroupArg::Config => FileGroup::Config,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skiff=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = match &cli.config_file {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_locations(),
    };
    let mut config = store.load()?;

    // Flags override file values, which override defaults.
    if let Some(hostname) = cli.hostname {
        config.hostname = hostname;
    }
    if let Some(model_path) = cli.model_path {
        config.model_path = model_path;
    }

    let options = DeployOptions::new()
        .with_groups(cli.include.into_iter().map(FileGroup::from))
        .with_instance_lifecycle(cli.start_stop_instance);

    let runner = SystemRunner;
    let deployer = Deployer::new(&runner, config);

    if cli.dry_run {
        for command in deployer.plan(&options)? {
            println!("{command}");
        }
        return Ok(());
    }

    let report = deployer.execute(&options)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &DeployReport) {
    println!("Deployed to {}", report.hostname);
    for transfer in &report.synced {
        let plural = if transfer.files == 1 { "" } else { "s" };
        println!("  synced {} ({} file{plural})", transfer.group, transfer.files);
    }
    for group in &report.skipped {
        println!("  skipped {group}");
    }
    if let Some(instance) = &report.instance {
        println!(
            "  instance {} ({}) started and stopped",
            instance.instance_id, instance.architecture
        );
    }
}
