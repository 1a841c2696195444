// ABOUTME: Sequences one deployment run: prerequisites, build, push, deploy, verify, report.
// ABOUTME: Any failure ends the run; a health failure first prints the target's recent logs.

use crate::config::RunConfig;
use crate::deploy::{Deployed, Deployment, ImageReady, PrereqsChecked, RunReport};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::health::{HealthProbe, HealthVerifier};
use crate::output::Output;
use crate::target::{TargetDeployer, deployer_for};

/// Drives the pipeline for one immutable configuration.
pub struct Orchestrator<'a, R, P> {
    config: &'a RunConfig,
    runner: &'a R,
    verifier: HealthVerifier<P>,
    output: &'a Output,
}

impl<'a, R: CommandRunner, P: HealthProbe> Orchestrator<'a, R, P> {
    pub fn new(config: &'a RunConfig, runner: &'a R, probe: P, output: &'a Output) -> Self {
        Self {
            config,
            runner,
            verifier: HealthVerifier::new(probe, config.health.clone()),
            output,
        }
    }

    /// Run every step in order. Warnings collected along the way are
    /// printed whether or not the run succeeds.
    pub async fn run(&self) -> Result<RunReport> {
        let mut diag = Diagnostics::default();
        let result = self.run_pipeline(&mut diag).await;
        for warning in diag.warnings() {
            self.output.warning(&warning.message);
        }
        result
    }

    async fn run_pipeline(&self, diag: &mut Diagnostics) -> Result<RunReport> {
        let config = self.config;
        self.output.info(&format!(
            "Deploying {} ({}) to {}",
            config.app, config.environment, config.target
        ));

        self.output.info("Checking prerequisites...");
        let checked = Deployment::new(config)
            .check_prerequisites(self.runner)
            .await?;
        self.output.info("Prerequisites satisfied");

        let ready = self.prepare_image(checked, diag).await?;

        let deployer = deployer_for(config, self.runner);
        self.output
            .info(&format!("Deploying {} to {}...", ready.image(), config.target));
        let deployed = ready.deploy(deployer.as_ref(), self.output).await?;

        let deployed = if deployer.blocks_until_rolled_out() {
            deployed
        } else {
            self.output.info("Waiting for services to become ready...");
            match deployed.await_ready(&self.verifier, self.runner).await {
                Ok(deployed) => deployed,
                Err((deployed, e)) => {
                    return Err(self.health_failure(&deployed, deployer.as_ref(), e, diag).await);
                }
            }
        };

        self.output.info("Verifying service health...");
        let verified = match deployed.verify(&self.verifier, self.runner).await {
            Ok(verified) => verified,
            Err((deployed, e)) => {
                return Err(self.health_failure(&deployed, deployer.as_ref(), e, diag).await);
            }
        };
        self.output.success(&format!(
            "Health check passed at {} (attempt {}/{})",
            verified.endpoint(),
            verified.state().attempts,
            self.verifier.policy().max_attempts
        ));

        let status = match deployer.status().await {
            Ok(listing) => {
                self.output.block("Deployment status:", &listing);
                Some(listing)
            }
            Err(e) => {
                diag.warn(Warning::status_unavailable(e.to_string()));
                None
            }
        };

        Ok(verified.finish(status))
    }

    /// Build (and push) the image, or settle on the configured reference.
    async fn prepare_image(
        &self,
        checked: Deployment<'a, PrereqsChecked>,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<'a, ImageReady>> {
        let config = self.config;

        if !config.build {
            if config.push {
                diag.warn(Warning::push_skipped(
                    "push requested without a build; nothing was pushed",
                ));
            }
            self.output
                .info(&format!("Skipping build, deploying {}", config.image));
            return Ok(checked.skip_build());
        }

        self.output.info(&format!("Building image {}...", config.image));
        let built = checked.build_image(self.runner, diag).await?;
        let image = built.state().image();
        self.output.info(&format!(
            "Built {} (also tagged {})",
            image.primary,
            image.timestamped.tag()
        ));

        if !config.push {
            return Ok(built.skip_push());
        }

        self.output.info("Pushing image...");
        let ready = built.push_image(self.runner).await?;
        for tag in &ready.state().pushed {
            self.output.info(&format!("Pushed {}", tag));
        }
        Ok(ready)
    }

    /// Show the target's recent logs, then hand the error back.
    async fn health_failure(
        &self,
        deployed: &Deployment<'_, Deployed>,
        deployer: &dyn TargetDeployer,
        error: Error,
        diag: &mut Diagnostics,
    ) -> Error {
        let lines = self.config.log_tail_lines;
        match deployer.log_tail(lines).await {
            Ok(logs) => self.output.block(
                &format!("Last {} log lines for {}:", lines, deployed.image()),
                &logs,
            ),
            Err(e) => diag.warn(Warning::logs_unavailable(e.to_string())),
        }
        error
    }
}
