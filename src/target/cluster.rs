// ABOUTME: Kubernetes deployer driving kubectl.
// ABOUTME: Namespace, secret and manifest setup are idempotent; rollout status blocks until done.

use async_trait::async_trait;

use super::{DeployError, TargetDeployer};
use crate::config::RunConfig;
use crate::exec::{CommandRunner, Invocation};
use crate::output::Output;
use crate::types::{ImageRef, ResourceName};

pub struct ClusterDeployer<'a, R> {
    runner: &'a R,
    config: &'a RunConfig,
    namespace: &'a ResourceName,
}

impl<'a, R: CommandRunner> ClusterDeployer<'a, R> {
    pub fn new(config: &'a RunConfig, namespace: &'a ResourceName, runner: &'a R) -> Self {
        Self {
            runner,
            config,
            namespace,
        }
    }

    fn kubectl(&self) -> Invocation {
        Invocation::new("kubectl")
    }

    fn deployment_ref(&self) -> String {
        format!("deployment/{}", self.config.names.deployment)
    }

    /// Create the namespace; an existing one is fine, anything else is not.
    pub async fn ensure_namespace(&self, output: &Output) -> Result<(), DeployError> {
        let inv = self
            .kubectl()
            .args(["create", "namespace"])
            .arg(self.namespace.as_str());

        let result = self.runner.run(&inv).await;
        let message = match result {
            Ok(out) if out.success() => {
                output.info(&format!("Created namespace {}", self.namespace));
                return Ok(());
            }
            Ok(out) => out.message(),
            Err(e) => e.platform_message(),
        };

        if is_already_exists(&message) {
            tracing::debug!(namespace = %self.namespace, "namespace already exists");
            output.info(&format!("Namespace {} already exists", self.namespace));
            Ok(())
        } else {
            Err(DeployError::Namespace {
                namespace: self.namespace.to_string(),
                message,
            })
        }
    }

    /// Render the env file as a secret and apply it (create or replace).
    /// Skipped entirely when the env file is absent.
    pub async fn apply_secret(&self, output: &Output) -> Result<(), DeployError> {
        let source = &self.config.secret_env_file;
        if !source.is_file() {
            output.info(&format!(
                "No secret source at {}, skipping secret",
                source.display()
            ));
            return Ok(());
        }

        let secret = &self.config.names.secret;
        let secret_error = |message: String| DeployError::Secret {
            name: secret.to_string(),
            message,
        };

        let render = self
            .kubectl()
            .args(["create", "secret", "generic"])
            .arg(secret.as_str())
            .arg(format!("--from-env-file={}", source.display()))
            .arg("--namespace")
            .arg(self.namespace.as_str())
            .args(["--dry-run=client", "-o", "yaml"]);
        let manifest = self
            .runner
            .run_checked(&render)
            .await
            .map_err(|e| secret_error(e.platform_message()))?;

        let apply = self
            .kubectl()
            .args(["apply", "-f", "-", "--namespace"])
            .arg(self.namespace.as_str())
            .stdin(manifest.stdout);
        self.runner
            .run_checked(&apply)
            .await
            .map_err(|e| secret_error(e.platform_message()))?;

        output.info(&format!("Applied secret {}", secret));
        Ok(())
    }

    pub async fn apply_manifests(&self, output: &Output) -> Result<(), DeployError> {
        let dir = &self.config.manifests_dir;
        let inv = self
            .kubectl()
            .args(["apply", "-f"])
            .arg(dir.to_string_lossy())
            .arg("--namespace")
            .arg(self.namespace.as_str());

        self.runner
            .run_checked(&inv)
            .await
            .map_err(|e| DeployError::Manifests {
                dir: dir.clone(),
                message: e.platform_message(),
            })?;

        output.info(&format!("Applied manifests from {}", dir.display()));
        Ok(())
    }

    pub async fn update_image(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        let names = &self.config.names;
        let inv = self
            .kubectl()
            .args(["set", "image"])
            .arg(self.deployment_ref())
            .arg(format!("{}={}", names.container, image))
            .arg("--namespace")
            .arg(self.namespace.as_str());

        self.runner
            .run_checked(&inv)
            .await
            .map_err(|e| DeployError::ImageUpdate {
                deployment: names.deployment.to_string(),
                message: e.platform_message(),
            })?;

        output.info(&format!(
            "Updated {} container {} to {}",
            self.deployment_ref(),
            names.container,
            image
        ));
        Ok(())
    }

    /// Block until kubectl reports the rollout complete (or failed, or timed out).
    pub async fn wait_for_rollout(&self, output: &Output) -> Result<(), DeployError> {
        output.info(&format!(
            "Waiting for rollout of {} (timeout {}s)...",
            self.deployment_ref(),
            self.config.rollout_timeout.as_secs()
        ));

        let inv = self
            .kubectl()
            .args(["rollout", "status"])
            .arg(self.deployment_ref())
            .arg("--namespace")
            .arg(self.namespace.as_str())
            .arg(format!("--timeout={}s", self.config.rollout_timeout.as_secs()));

        self.runner
            .run_checked(&inv)
            .await
            .map_err(|e| DeployError::Rollout {
                deployment: self.config.names.deployment.to_string(),
                message: e.platform_message(),
            })?;

        output.success(&format!("Rollout of {} complete", self.deployment_ref()));
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> TargetDeployer for ClusterDeployer<'_, R> {
    async fn deploy(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        self.ensure_namespace(output).await?;
        self.apply_secret(output).await?;
        self.apply_manifests(output).await?;
        self.update_image(image, output).await?;
        self.wait_for_rollout(output).await
    }

    fn blocks_until_rolled_out(&self) -> bool {
        true
    }

    async fn status(&self) -> Result<String, DeployError> {
        let inv = self
            .kubectl()
            .args(["get", "pods", "--namespace"])
            .arg(self.namespace.as_str())
            .args(["-o", "wide"]);
        self.runner
            .run_checked(&inv)
            .await
            .map(|out| out.stdout)
            .map_err(|e| DeployError::Query {
                what: "pods",
                message: e.platform_message(),
            })
    }

    async fn log_tail(&self, lines: u32) -> Result<String, DeployError> {
        let inv = self
            .kubectl()
            .arg("logs")
            .arg(self.deployment_ref())
            .arg("--namespace")
            .arg(self.namespace.as_str())
            .arg(format!("--tail={}", lines));
        self.runner
            .run_checked(&inv)
            .await
            .map(|out| out.stdout)
            .map_err(|e| DeployError::Query {
                what: "deployment logs",
                message: e.platform_message(),
            })
    }
}

/// kubectl reports `Error from server (AlreadyExists): namespaces "x" already exists`.
fn is_already_exists(message: &str) -> bool {
    message.contains("AlreadyExists") || message.to_lowercase().contains("already exists")
}
