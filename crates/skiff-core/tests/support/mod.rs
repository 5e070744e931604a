#![allow(dead_code)]
//! Recording fake runner shared by the integration suites.

use std::cell::RefCell;

use skiff_core::exec::{CommandLine, CommandRunner, ProcessOutput};

/// Records every command and replies with scripted or default-success output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandLine>>,
    responses: Vec<(String, ProcessOutput)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` for any command whose rendering contains `needle`.
    pub fn respond_with(mut self, needle: &str, output: ProcessOutput) -> Self {
        self.responses.push((needle.to_string(), output));
        self
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.borrow().clone()
    }

    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|command| command.to_string())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &CommandLine) -> anyhow::Result<ProcessOutput> {
        self.calls.borrow_mut().push(command.clone());
        let rendered = command.to_string();
        for (needle, output) in &self.responses {
            if rendered.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(ProcessOutput::ok())
    }
}

/// describe-instances body for a single matching instance.
pub fn describe_json(instance_id: &str, architecture: &str) -> String {
    format!(
        r#"{{"Reservations":[{{"Instances":[{{"InstanceId":"{instance_id}","Architecture":"{architecture}"}}]}}]}}"#
    )
}
