//! External process invocation seam.
//!
//! Every external collaborator (rsync, ssh, the aws CLI) is reached through
//! [`CommandRunner`], so the deployment sequence can be exercised against a
//! recording fake in tests.

use std::fmt;
use std::process::Command;

use anyhow::Context;

/// A fully resolved external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of a completed external command: exit status plus captured
/// stdout/stderr text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, if the process terminated normally.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A zero exit status with no captured output.
    pub fn ok() -> Self {
        Self {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// A zero exit status carrying the given stdout text.
    pub fn ok_with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn status_label(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// Executes resolved command lines.
pub trait CommandRunner: fmt::Debug {
    fn run(&self, command: &CommandLine) -> anyhow::Result<ProcessOutput>;
}

/// Runs commands on the local system via `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> anyhow::Result<ProcessOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .with_context(|| format!("Failed to invoke {}", command.program))?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command, log its captured output, and fail on a non-zero status.
///
/// `what` names the step in logs and error messages (e.g. "rsync of bot").
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &CommandLine,
    what: &str,
) -> anyhow::Result<ProcessOutput> {
    tracing::debug!(command = %command, "running {what}");
    let output = runner
        .run(command)
        .with_context(|| format!("Failed to run {what}"))?;

    if !output.stdout.is_empty() {
        tracing::debug!("{}", output.stdout.trim_end());
    }
    if !output.success() {
        anyhow::bail!(
            "{what} failed with status {}: {}",
            output.status_label(),
            output.stderr.trim()
        );
    }
    if !output.stderr.is_empty() {
        tracing::warn!("{what} reported: {}", output.stderr.trim_end());
    }

    Ok(output)
}
