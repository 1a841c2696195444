// ABOUTME: Image build and push through the docker CLI.
// ABOUTME: One build produces two tags (caller tag + environment timestamp tag), pushed together.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::{Environment, RunConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::exec::{CommandRunner, ExecError, Invocation};
use crate::types::{ImageRef, ParseImageRefError};

/// Label value used when the source revision cannot be determined.
pub const UNKNOWN_REVISION: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid image tag: {0}")]
    InvalidTag(#[from] ParseImageRefError),

    #[error("docker build failed: {}", .0.platform_message())]
    Builder(#[source] ExecError),
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("failed to push {image}: {message}")]
    Pusher { image: String, message: String },
}

/// Informational build labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    pub built_at: DateTime<Utc>,
    pub vcs_ref: String,
}

impl BuildMetadata {
    /// `BUILD_DATE` build argument, RFC 3339 to the second.
    pub fn build_date(&self) -> String {
        self.built_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// A successfully built image and both of its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    /// Tagged with the caller-supplied tag; this is what gets deployed.
    pub primary: ImageRef,
    /// Tagged `<environment>-<YYYYMMDD-HHMMSS>`, computed once at build time.
    pub timestamped: ImageRef,
    pub metadata: BuildMetadata,
}

impl BuiltImage {
    pub fn tags(&self) -> [&ImageRef; 2] {
        [&self.primary, &self.timestamped]
    }
}

/// Timestamp-derived tag for an environment.
pub fn timestamp_tag(environment: Environment, at: DateTime<Utc>) -> String {
    format!("{}-{}", environment, at.format("%Y%m%d-%H%M%S"))
}

/// Drives `docker build` and `docker push` for the configured image.
pub struct ImageBuilder<'a, R> {
    runner: &'a R,
    config: &'a RunConfig,
}

impl<'a, R: CommandRunner> ImageBuilder<'a, R> {
    pub fn new(config: &'a RunConfig, runner: &'a R) -> Self {
        Self { runner, config }
    }

    /// Short hash of `HEAD`, or `unknown` (recorded as a warning) outside a git checkout.
    pub async fn source_revision(&self, diag: &mut Diagnostics) -> String {
        let inv = Invocation::new("git").args(["rev-parse", "--short", "HEAD"]);
        match self.runner.run_checked(&inv).await {
            Ok(output) if !output.stdout.trim().is_empty() => output.stdout.trim().to_string(),
            Ok(_) => {
                diag.warn(Warning::revision_unavailable(
                    "git rev-parse printed no revision; labeling image with 'unknown'",
                ));
                UNKNOWN_REVISION.to_string()
            }
            Err(e) => {
                diag.warn(Warning::revision_unavailable(format!(
                    "could not read source revision ({}); labeling image with 'unknown'",
                    e.platform_message()
                )));
                UNKNOWN_REVISION.to_string()
            }
        }
    }

    /// Build once, tagged twice.
    pub async fn build(&self, metadata: BuildMetadata) -> Result<BuiltImage, BuildError> {
        let primary = self.config.image.clone();
        let timestamped = primary.with_tag(&timestamp_tag(
            self.config.environment,
            metadata.built_at,
        ))?;

        let mut inv = Invocation::new("docker")
            .arg("build")
            .arg("-t")
            .arg(primary.to_string())
            .arg("-t")
            .arg(timestamped.to_string())
            .arg("--build-arg")
            .arg(format!("BUILD_DATE={}", metadata.build_date()))
            .arg("--build-arg")
            .arg(format!("VCS_REF={}", metadata.vcs_ref))
            .arg("--build-arg")
            .arg(format!("ENVIRONMENT={}", self.config.environment));
        if let Some(dockerfile) = &self.config.dockerfile {
            inv = inv.arg("-f").arg(dockerfile.to_string_lossy());
        }
        let inv = inv.arg(self.config.build_context.to_string_lossy());

        tracing::info!(image = %primary, extra_tag = %timestamped.tag(), "building image");
        self.runner
            .run_checked(&inv)
            .await
            .map_err(BuildError::Builder)?;

        Ok(BuiltImage {
            primary,
            timestamped,
            metadata,
        })
    }

    /// Push both tags of a built image.
    pub async fn push(&self, image: &BuiltImage) -> Result<(), PushError> {
        for tag in image.tags() {
            tracing::info!(image = %tag, "pushing image");
            let inv = Invocation::new("docker").arg("push").arg(tag.to_string());
            self.runner
                .run_checked(&inv)
                .await
                .map_err(|e| PushError::Pusher {
                    image: tag.to_string(),
                    message: e.platform_message(),
                })?;
        }
        Ok(())
    }
}
