//! EC2 instance lifecycle management via the aws CLI.
//!
//! The instance backing a deployment target is located by its Name tag; the
//! same lookup yields the CPU architecture that selects the bot binary to
//! ship.

use anyhow::Context;
use serde::Deserialize;

use crate::exec::{CommandLine, CommandRunner, run_checked};
use crate::types::CpuArchitecture;

/// Identity and architecture of the instance backing a deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub architecture: CpuArchitecture,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstances {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Instance {
    instance_id: String,
    architecture: String,
}

pub fn describe_command(name_tag: &str) -> CommandLine {
    CommandLine::new("aws")
        .args(["ec2", "describe-instances"])
        .arg("--filters")
        .arg(format!("Name=tag:Name,Values={name_tag}"))
        .args(["--output", "json"])
}

pub fn start_command(instance_id: &str) -> CommandLine {
    CommandLine::new("aws").args(["ec2", "start-instances", "--instance-ids", instance_id])
}

pub fn stop_command(instance_id: &str) -> CommandLine {
    CommandLine::new("aws").args(["ec2", "stop-instances", "--instance-ids", instance_id])
}

pub fn wait_command(state: &str, instance_id: &str) -> CommandLine {
    CommandLine::new("aws").args(["ec2", "wait", state, "--instance-ids", instance_id])
}

/// Drives instance start/stop around a deployment.
#[derive(Debug)]
pub struct Ec2Lifecycle<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Ec2Lifecycle<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Look up the instance carrying the given Name tag.
    ///
    /// Fails when no instance matches. When several match, the first one
    /// wins and the rest are reported as a warning.
    pub fn describe_by_name(&self, name_tag: &str) -> anyhow::Result<InstanceInfo> {
        let output = run_checked(
            self.runner,
            &describe_command(name_tag),
            "aws describe-instances",
        )?;
        let decoded: DescribeInstances = serde_json::from_str(&output.stdout)
            .context("Unexpected describe-instances output")?;

        let mut instances = decoded
            .reservations
            .into_iter()
            .flat_map(|reservation| reservation.instances);
        let first = instances
            .next()
            .ok_or_else(|| anyhow::anyhow!("No instance found with Name tag `{name_tag}`"))?;
        let ignored: Vec<String> = instances.map(|i| i.instance_id).collect();
        if !ignored.is_empty() {
            tracing::warn!(
                "multiple instances match Name tag `{name_tag}`; using {} and ignoring {}",
                first.instance_id,
                ignored.join(", ")
            );
        }

        let architecture: CpuArchitecture = first.architecture.parse()?;
        Ok(InstanceInfo {
            instance_id: first.instance_id,
            architecture,
        })
    }

    /// Start the instance and block until EC2 reports it running.
    pub fn start_and_wait(&self, instance_id: &str) -> anyhow::Result<()> {
        run_checked(
            self.runner,
            &start_command(instance_id),
            "aws start-instances",
        )?;
        run_checked(
            self.runner,
            &wait_command("instance-running", instance_id),
            "aws wait instance-running",
        )?;
        Ok(())
    }

    /// Stop the instance and block until EC2 reports it stopped.
    pub fn stop_and_wait(&self, instance_id: &str) -> anyhow::Result<()> {
        run_checked(
            self.runner,
            &stop_command(instance_id),
            "aws stop-instances",
        )?;
        run_checked(
            self.runner,
            &wait_command("instance-stopped", instance_id),
            "aws wait instance-stopped",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ProcessOutput;

    #[derive(Debug)]
    struct StaticRunner(ProcessOutput);

    impl CommandRunner for StaticRunner {
        fn run(&self, _command: &CommandLine) -> anyhow::Result<ProcessOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn describe_decodes_instance_id_and_architecture() {
        let runner = StaticRunner(ProcessOutput::ok_with_stdout(
            r#"{"Reservations":[{"Instances":[{"InstanceId":"i-0abc","Architecture":"arm64"}]}]}"#,
        ));

        let info = Ec2Lifecycle::new(&runner).describe_by_name("aws-ec2-4").unwrap();
        assert_eq!(info.instance_id, "i-0abc");
        assert_eq!(info.architecture, CpuArchitecture::Arm64);
    }

    #[test]
    fn describe_fails_when_nothing_matches() {
        let runner = StaticRunner(ProcessOutput::ok_with_stdout(r#"{"Reservations":[]}"#));

        let err = Ec2Lifecycle::new(&runner)
            .describe_by_name("missing-host")
            .unwrap_err();
        assert!(err.to_string().contains("No instance found"));
    }

    #[test]
    fn describe_takes_the_first_of_multiple_matches() {
        let runner = StaticRunner(ProcessOutput::ok_with_stdout(
            r#"{"Reservations":[
                {"Instances":[{"InstanceId":"i-first","Architecture":"x86_64"}]},
                {"Instances":[{"InstanceId":"i-second","Architecture":"arm64"}]}
            ]}"#,
        ));

        let info = Ec2Lifecycle::new(&runner).describe_by_name("aws-ec2-4").unwrap();
        assert_eq!(info.instance_id, "i-first");
        assert_eq!(info.architecture, CpuArchitecture::X86_64);
    }

    #[test]
    fn describe_fails_on_unrecognized_architecture() {
        let runner = StaticRunner(ProcessOutput::ok_with_stdout(
            r#"{"Reservations":[{"Instances":[{"InstanceId":"i-0abc","Architecture":"ia64"}]}]}"#,
        ));

        let err = Ec2Lifecycle::new(&runner)
            .describe_by_name("aws-ec2-4")
            .unwrap_err();
        assert!(err.to_string().contains("unrecognized instance architecture"));
    }

    #[test]
    fn commands_target_the_given_instance() {
        assert_eq!(
            start_command("i-0abc").to_string(),
            "aws ec2 start-instances --instance-ids i-0abc"
        );
        assert_eq!(
            wait_command("instance-stopped", "i-0abc").to_string(),
            "aws ec2 wait instance-stopped --instance-ids i-0abc"
        );
    }
}
