// ABOUTME: State transition methods for the deployment pipeline.
// ABOUTME: Each method consumes self and returns the next state on success.

use chrono::Utc;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::health::{HealthCheckOutcome, HealthEndpoint, HealthProbe, HealthVerifier};
use crate::image::{BuildMetadata, ImageBuilder};
use crate::output::Output;
use crate::prereq::PrerequisiteChecker;
use crate::target::TargetDeployer;

use super::deployment::{Deployment, RunReport};
use super::state::{Deployed, ImageBuilt, ImageReady, Initialized, PrereqsChecked, Verified};

/// Result type for transitions that hand the deployment back on failure,
/// so the caller can still inspect the target (e.g. fetch its logs).
pub type TransitionResult<'a, T, S> =
    std::result::Result<Deployment<'a, T>, (Deployment<'a, S>, Error)>;

impl<'a, S> Deployment<'a, S> {
    fn transition<T>(self, state: T) -> Deployment<'a, T> {
        Deployment {
            config: self.config,
            state,
        }
    }
}

// =============================================================================
// Initialized -> PrereqsChecked
// =============================================================================

impl<'a> Deployment<'a, Initialized> {
    /// Verify tools and required files. Read-only.
    pub async fn check_prerequisites<R: CommandRunner>(
        self,
        runner: &R,
    ) -> Result<Deployment<'a, PrereqsChecked>> {
        PrerequisiteChecker::for_config(self.config, runner)
            .check()
            .await?;
        Ok(self.transition(PrereqsChecked))
    }
}

// =============================================================================
// PrereqsChecked -> ImageBuilt | ImageReady
// =============================================================================

impl<'a> Deployment<'a, PrereqsChecked> {
    /// Build the configured image under its tag and a timestamp tag.
    pub async fn build_image<R: CommandRunner>(
        self,
        runner: &R,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<'a, ImageBuilt>> {
        let builder = ImageBuilder::new(self.config, runner);
        let metadata = BuildMetadata {
            built_at: Utc::now(),
            vcs_ref: builder.source_revision(diag).await,
        };
        let image = builder.build(metadata).await?;
        Ok(self.transition(ImageBuilt { image }))
    }

    /// Deploy the configured image reference as-is.
    pub fn skip_build(self) -> Deployment<'a, ImageReady> {
        let image = self.config.image.clone();
        self.transition(ImageReady {
            image,
            pushed: Vec::new(),
        })
    }
}

// =============================================================================
// ImageBuilt -> ImageReady
// =============================================================================

impl<'a> Deployment<'a, ImageBuilt> {
    /// Push both tags of the freshly built image.
    pub async fn push_image<R: CommandRunner>(
        self,
        runner: &R,
    ) -> Result<Deployment<'a, ImageReady>> {
        let built = &self.state.image;
        ImageBuilder::new(self.config, runner).push(built).await?;

        let image = built.primary.clone();
        let pushed = built.tags().into_iter().cloned().collect();
        Ok(self.transition(ImageReady { image, pushed }))
    }

    pub fn skip_push(self) -> Deployment<'a, ImageReady> {
        let image = self.state.image.primary.clone();
        self.transition(ImageReady {
            image,
            pushed: Vec::new(),
        })
    }
}

// =============================================================================
// ImageReady -> Deployed
// =============================================================================

impl<'a> Deployment<'a, ImageReady> {
    pub async fn deploy(
        self,
        deployer: &dyn TargetDeployer,
        output: &Output,
    ) -> Result<Deployment<'a, Deployed>> {
        deployer.deploy(&self.state.image, output).await?;
        let ImageReady { image, pushed } = self.state.clone();
        Ok(self.transition(Deployed { image, pushed }))
    }
}

// =============================================================================
// Deployed -> Verified
// =============================================================================

impl<'a> Deployment<'a, Deployed> {
    /// Readiness gate for targets whose deploy step does not wait for the
    /// rollout. Same policy as `verify`; stays in `Deployed` on success.
    pub async fn await_ready<P: HealthProbe, R: CommandRunner>(
        self,
        verifier: &HealthVerifier<P>,
        runner: &R,
    ) -> TransitionResult<'a, Deployed, Deployed> {
        match healthy(verifier.verify(self.config, runner).await) {
            Ok(_) => Ok(self),
            Err(e) => Err((self, e)),
        }
    }

    /// Final health verification.
    pub async fn verify<P: HealthProbe, R: CommandRunner>(
        self,
        verifier: &HealthVerifier<P>,
        runner: &R,
    ) -> TransitionResult<'a, Verified, Deployed> {
        match healthy(verifier.verify(self.config, runner).await) {
            Ok((endpoint, attempts)) => {
                let Deployed { image, pushed } = self.state.clone();
                Ok(self.transition(Verified {
                    image,
                    pushed,
                    endpoint,
                    attempts,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }
}

fn healthy(outcome: HealthCheckOutcome) -> Result<(HealthEndpoint, u32)> {
    match outcome {
        HealthCheckOutcome::Healthy { endpoint, attempts } => Ok((endpoint, attempts)),
        HealthCheckOutcome::Unreachable { reason } => Err(Error::HealthUnreachable(reason)),
        HealthCheckOutcome::ExhaustedRetries { endpoint, attempts } => {
            Err(Error::HealthCheckExhausted {
                attempts,
                endpoint: endpoint.to_string(),
            })
        }
    }
}

// =============================================================================
// Verified -> done
// =============================================================================

impl Deployment<'_, Verified> {
    pub fn finish(self, status: Option<String>) -> RunReport {
        let Verified {
            image,
            pushed,
            endpoint,
            attempts,
        } = self.state;
        RunReport {
            image,
            pushed,
            endpoint,
            health_attempts: attempts,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_outcome_becomes_health_error() {
        let err = healthy(HealthCheckOutcome::ExhaustedRetries {
            endpoint: HealthEndpoint::new("10.0.0.7", 8080, "/health"),
            attempts: 30,
        })
        .unwrap_err();
        assert!(matches!(err, Error::HealthCheckExhausted { attempts: 30, .. }));
    }

    #[test]
    fn unreachable_outcome_keeps_reason() {
        let err = healthy(HealthCheckOutcome::Unreachable {
            reason: "no ingress".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::HealthUnreachable(reason) if reason == "no ingress"));
    }
}
