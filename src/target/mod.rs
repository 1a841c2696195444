// ABOUTME: Target deployers: Kubernetes cluster via kubectl, local stack via docker compose.
// ABOUTME: Exactly one deployer is built per run, chosen from the configured target.

mod cluster;
mod local;

pub use cluster::ClusterDeployer;
pub use local::{ComposeContext, LocalDeployer};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::{DeployTarget, RunConfig};
use crate::exec::CommandRunner;
use crate::output::Output;
use crate::types::ImageRef;

/// Errors from the deploy step. Messages carry the platform's own output.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to create namespace {namespace}: {message}")]
    Namespace { namespace: String, message: String },

    #[error("failed to apply secret {name}: {message}")]
    Secret { name: String, message: String },

    #[error("failed to apply manifests from {}: {message}", dir.display())]
    Manifests { dir: PathBuf, message: String },

    #[error("failed to update image of deployment/{deployment}: {message}")]
    ImageUpdate { deployment: String, message: String },

    #[error("rollout of deployment/{deployment} failed: {message}")]
    Rollout { deployment: String, message: String },

    #[error("failed to stop local stack: {0}")]
    StackDown(String),

    #[error("failed to pull local stack images: {0}")]
    StackPull(String),

    #[error("failed to start local stack: {0}")]
    StackUp(String),

    #[error("failed to query {what}: {message}")]
    Query { what: &'static str, message: String },
}

/// One deployment platform.
#[async_trait]
pub trait TargetDeployer: Send + Sync {
    /// Roll the given image out to the target.
    async fn deploy(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError>;

    /// Whether `deploy` returns only after the platform reports the rollout done.
    /// Targets without such a primitive get a readiness probe gate instead.
    fn blocks_until_rolled_out(&self) -> bool;

    /// Human-readable listing of what is running (pods or containers).
    async fn status(&self) -> Result<String, DeployError>;

    /// Last `lines` lines of the service's logs, for diagnosing failures.
    async fn log_tail(&self, lines: u32) -> Result<String, DeployError>;
}

/// Build the deployer for the configured target. Only that variant's
/// steps can ever run in this process.
pub fn deployer_for<'a, R: CommandRunner>(
    config: &'a RunConfig,
    runner: &'a R,
) -> Box<dyn TargetDeployer + 'a> {
    match &config.target {
        DeployTarget::Cluster { namespace } => {
            Box::new(ClusterDeployer::new(config, namespace, runner))
        }
        DeployTarget::Local => Box::new(LocalDeployer::new(config, runner)),
    }
}
