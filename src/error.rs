// ABOUTME: Application-wide error types for deckhand.
// ABOUTME: Wraps each pipeline step's error and knows which stage it came from.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::image::{BuildError, PushError};
use crate::prereq::PrereqError;
use crate::target::DeployError;

/// Pipeline stage, used to label the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    CheckPrereqs,
    BuildImage,
    PushImage,
    DeployTarget,
    VerifyHealth,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::CheckPrereqs => "check-prereqs",
            Stage::BuildImage => "build-image",
            Stage::PushImage => "push-image",
            Stage::DeployTarget => "deploy-target",
            Stage::VerifyHealth => "verify-health",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Prereq(#[from] PrereqError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Push(#[from] PushError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("health endpoint unreachable: {0}")]
    HealthUnreachable(String),

    #[error("health check failed after {attempts} attempts against {endpoint}")]
    HealthCheckExhausted { attempts: u32, endpoint: String },

    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// The pipeline stage this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Prereq(_) => Stage::CheckPrereqs,
            Error::Build(_) => Stage::BuildImage,
            Error::Push(_) => Stage::PushImage,
            Error::Deploy(_) => Stage::DeployTarget,
            Error::HealthUnreachable(_) | Error::HealthCheckExhausted { .. } => Stage::VerifyHealth,
            Error::ConfigNotFound(_) | Error::InvalidConfig(_) | Error::Io(_) | Error::Yaml(_) => {
                Stage::Configure
            }
        }
    }

    /// `[stage] message`, the form printed on the final error line.
    pub fn report(&self) -> String {
        format!("[{}] {}", self.stage(), self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
