// ABOUTME: Prerequisite checks that run before any state-changing step.
// ABOUTME: Verifies required CLIs are invocable and the production config artifact exists.

use std::path::{Path, PathBuf};

use crate::config::{RunConfig, TargetKind};
use crate::exec::{CommandRunner, ExecErrorKind, Invocation};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrereqError {
    #[error("required tool not found: {0}")]
    ToolMissing(String),

    #[error("production configuration not found: {}", .0.display())]
    ConfigMissing(PathBuf),
}

/// An external tool and the cheap query that proves it can be invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: String,
    pub probe: Invocation,
}

impl Tool {
    pub fn new(name: impl Into<String>, probe: Invocation) -> Self {
        Self {
            name: name.into(),
            probe,
        }
    }

    pub fn docker() -> Self {
        Self::new("docker", Invocation::new("docker").arg("--version"))
    }

    pub fn kubectl() -> Self {
        Self::new(
            "kubectl",
            Invocation::new("kubectl").args(["version", "--client"]),
        )
    }

    pub fn compose() -> Self {
        Self::new(
            "docker compose",
            Invocation::new("docker").args(["compose", "version"]),
        )
    }
}

/// The fixed tool list for a target, in check order.
pub fn required_tools(target: TargetKind) -> Vec<Tool> {
    match target {
        TargetKind::Cluster => vec![Tool::docker(), Tool::kubectl()],
        TargetKind::Local => vec![Tool::docker(), Tool::compose()],
    }
}

/// Read-only gate in front of the pipeline.
pub struct PrerequisiteChecker<'a, R> {
    runner: &'a R,
    tools: Vec<Tool>,
    required_file: Option<PathBuf>,
}

impl<'a, R: CommandRunner> PrerequisiteChecker<'a, R> {
    pub fn new(runner: &'a R, tools: Vec<Tool>) -> Self {
        Self {
            runner,
            tools,
            required_file: None,
        }
    }

    /// Checker for a run: the target's tools, plus the production
    /// config artifact when deploying to production.
    pub fn for_config(config: &RunConfig, runner: &'a R) -> Self {
        let checker = Self::new(runner, required_tools(config.target.kind()));
        if config.environment.is_production() {
            checker.require_file(&config.production_config)
        } else {
            checker
        }
    }

    pub fn require_file(mut self, path: &Path) -> Self {
        self.required_file = Some(path.to_path_buf());
        self
    }

    /// Stops at the first missing tool; later tools are not probed.
    pub async fn check(&self) -> Result<(), PrereqError> {
        for tool in &self.tools {
            if !self.is_invocable(tool).await {
                return Err(PrereqError::ToolMissing(tool.name.clone()));
            }
            tracing::debug!(tool = %tool.name, "tool available");
        }

        if let Some(path) = &self.required_file
            && !path.is_file()
        {
            return Err(PrereqError::ConfigMissing(path.clone()));
        }

        Ok(())
    }

    async fn is_invocable(&self, tool: &Tool) -> bool {
        match self.runner.run(&tool.probe).await {
            Ok(output) => output.success(),
            Err(e) if e.kind() == ExecErrorKind::NotFound => {
                tracing::debug!(tool = %tool.name, "not on PATH");
                false
            }
            Err(e) => {
                tracing::warn!(tool = %tool.name, error = %e, "tool could not be run");
                false
            }
        }
    }
}
