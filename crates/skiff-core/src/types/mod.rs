//! Shared core types: file groups, instance architectures, build targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named bundle of related files transferred together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileGroup {
    /// Compiled bot binary for the target architecture.
    Bot,
    /// Model artifact the bot loads at runtime.
    Model,
    /// Config files and the crontab.
    Config,
}

impl FileGroup {
    /// All groups, in deployment order.
    pub const ALL: [FileGroup; 3] = [FileGroup::Bot, FileGroup::Model, FileGroup::Config];

    pub fn as_str(self) -> &'static str {
        match self {
            FileGroup::Bot => "bot",
            FileGroup::Model => "model",
            FileGroup::Config => "config",
        }
    }
}

impl fmt::Display for FileGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file group `{0}` (expected bot, model or config)")]
pub struct UnknownFileGroup(pub String);

impl FromStr for FileGroup {
    type Err = UnknownFileGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bot" => Ok(FileGroup::Bot),
            "model" => Ok(FileGroup::Model),
            "config" => Ok(FileGroup::Config),
            other => Err(UnknownFileGroup(other.to_string())),
        }
    }
}

/// CPU architecture as reported by EC2 for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuArchitecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl CpuArchitecture {
    /// Build-target triple the release binary is compiled for on this
    /// architecture.
    pub fn build_target(self) -> BuildTarget {
        match self {
            CpuArchitecture::X86_64 => BuildTarget("x86_64-unknown-linux-gnu"),
            CpuArchitecture::Arm64 => BuildTarget("aarch64-unknown-linux-gnu"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CpuArchitecture::X86_64 => "x86_64",
            CpuArchitecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized instance architecture `{0}`")]
pub struct UnknownArchitecture(pub String);

impl FromStr for CpuArchitecture {
    type Err = UnknownArchitecture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(CpuArchitecture::X86_64),
            "arm64" => Ok(CpuArchitecture::Arm64),
            other => Err(UnknownArchitecture(other.to_string())),
        }
    }
}

/// Build-target triple identifying the compiled binary's OS/CPU variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget(&'static str);

impl BuildTarget {
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}
