// ABOUTME: Local deployer driving docker compose.
// ABOUTME: Replaces the running stack (down, pull, up -d) and waits a fixed settle period.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{DeployError, TargetDeployer};
use crate::config::{Environment, RunConfig};
use crate::exec::{CommandRunner, ExecErrorKind, Invocation};
use crate::output::Output;
use crate::types::ImageRef;

/// Variables the compose file can interpolate.
#[derive(Debug, Clone)]
pub struct ComposeContext {
    pub image: ImageRef,
    pub environment: Environment,
}

impl ComposeContext {
    pub fn to_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("IMAGE".to_string(), self.image.to_string());
        env.insert("IMAGE_TAG".to_string(), self.image.tag().to_string());
        env.insert("IMAGE_NAME".to_string(), self.image.name().to_string());
        env.insert(
            "DOCKER_REGISTRY".to_string(),
            self.image.registry().unwrap_or_default().to_string(),
        );
        env.insert("ENVIRONMENT".to_string(), self.environment.to_string());
        env
    }
}

pub struct LocalDeployer<'a, R> {
    runner: &'a R,
    config: &'a RunConfig,
}

impl<'a, R: CommandRunner> LocalDeployer<'a, R> {
    pub fn new(config: &'a RunConfig, runner: &'a R) -> Self {
        Self { runner, config }
    }

    /// `docker compose [-f file]` with the image variables set.
    fn compose(&self, image: &ImageRef) -> Invocation {
        let context = ComposeContext {
            image: image.clone(),
            environment: self.config.environment,
        };
        self.base().envs(context.to_env())
    }

    fn base(&self) -> Invocation {
        let inv = Invocation::new("docker").arg("compose");
        match &self.config.compose_file {
            Some(file) => inv.arg("-f").arg(file.to_string_lossy()),
            None => inv,
        }
    }

    /// Stop whatever is running. Nothing running is not an error.
    pub async fn stop_stack(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        let inv = self.compose(image).arg("down");
        match self.runner.run_checked(&inv).await {
            Ok(_) => {
                output.info("Stopped previous stack");
                Ok(())
            }
            Err(e)
                if e.kind() == ExecErrorKind::NonZeroExit
                    && is_nothing_running(&e.platform_message()) =>
            {
                tracing::debug!(message = %e.platform_message(), "no stack was running");
                Ok(())
            }
            Err(e) => Err(DeployError::StackDown(e.platform_message())),
        }
    }

    pub async fn pull(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        let inv = self.compose(image).arg("pull");
        self.runner
            .run_checked(&inv)
            .await
            .map_err(|e| DeployError::StackPull(e.platform_message()))?;
        output.info("Pulled stack images");
        Ok(())
    }

    pub async fn start_stack(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        let inv = self.compose(image).args(["up", "-d"]);
        self.runner
            .run_checked(&inv)
            .await
            .map_err(|e| DeployError::StackUp(e.platform_message()))?;
        output.info(&format!("Started stack with {}", image));
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> TargetDeployer for LocalDeployer<'_, R> {
    async fn deploy(&self, image: &ImageRef, output: &Output) -> Result<(), DeployError> {
        self.stop_stack(image, output).await?;
        self.pull(image, output).await?;
        self.start_stack(image, output).await?;

        let settle = self.config.settle;
        if !settle.is_zero() {
            output.info(&format!(
                "Waiting {}s for services to settle...",
                settle.as_secs()
            ));
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }

    fn blocks_until_rolled_out(&self) -> bool {
        false
    }

    async fn status(&self) -> Result<String, DeployError> {
        let inv = self.base().arg("ps");
        self.runner
            .run_checked(&inv)
            .await
            .map(|out| out.stdout)
            .map_err(|e| DeployError::Query {
                what: "containers",
                message: e.platform_message(),
            })
    }

    async fn log_tail(&self, lines: u32) -> Result<String, DeployError> {
        let inv = self
            .base()
            .arg("logs")
            .arg(format!("--tail={}", lines))
            .arg("--no-color");
        self.runner
            .run_checked(&inv)
            .await
            .map(|out| out.stdout)
            .map_err(|e| DeployError::Query {
                what: "stack logs",
                message: e.platform_message(),
            })
    }
}

fn is_nothing_running(message: &str) -> bool {
    let message = message.to_lowercase();
    ["no such container", "not running", "no resource found"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_env_carries_image_parts() {
        let context = ComposeContext {
            image: ImageRef::new(Some("registry.example.com/team"), "transcriber", "v2").unwrap(),
            environment: Environment::Staging,
        };
        let env = context.to_env();
        assert_eq!(env["IMAGE"], "registry.example.com/team/transcriber:v2");
        assert_eq!(env["IMAGE_TAG"], "v2");
        assert_eq!(env["IMAGE_NAME"], "transcriber");
        assert_eq!(env["DOCKER_REGISTRY"], "registry.example.com/team");
        assert_eq!(env["ENVIRONMENT"], "staging");
    }

    #[test]
    fn registry_is_empty_when_unset() {
        let context = ComposeContext {
            image: ImageRef::new(None, "app", "latest").unwrap(),
            environment: Environment::Development,
        };
        assert_eq!(context.to_env()["DOCKER_REGISTRY"], "");
    }

    #[test]
    fn nothing_running_is_recognized() {
        assert!(is_nothing_running("Error: No such container: app-web-1"));
        assert!(!is_nothing_running("permission denied while trying to connect"));
    }
}
