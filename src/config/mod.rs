// ABOUTME: Run configuration: one validated, immutable value built at startup.
// ABOUTME: Merges CLI flags/env defaults with optional deckhand.yml settings.

mod environment;
mod health;
mod settings;
mod target;

pub use environment::Environment;
pub use health::{DEFAULT_HEALTH_PORT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, HealthPolicy};
pub use settings::{
    BuildSettings, ClusterSettings, LocalSettings, PathSettings, SETTINGS_FILENAME,
    SETTINGS_FILENAME_ALT, SETTINGS_FILENAME_DIR, Settings,
};
pub use target::{DeployTarget, TargetKind};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ImageRef, ResourceName};

pub const DEFAULT_IMAGE_NAME: &str = "app";
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// The values that come from flags or their environment-variable defaults.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub environment: Environment,
    pub tag: String,
    pub target: TargetKind,
    pub namespace: Option<String>,
    pub registry: Option<String>,
    pub image_name: String,
    pub build: bool,
    pub push: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            tag: DEFAULT_IMAGE_TAG.to_string(),
            target: TargetKind::default(),
            namespace: None,
            registry: None,
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            build: true,
            push: false,
        }
    }
}

/// Kubernetes object names used by the cluster deployer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNames {
    pub deployment: ResourceName,
    pub container: ResourceName,
    pub service: ResourceName,
    pub secret: ResourceName,
}

/// Immutable configuration for one deployment run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_dir: PathBuf,
    pub environment: Environment,
    pub target: DeployTarget,
    /// The configured `registry/name:tag`, deployed as-is when the build is skipped.
    pub image: ImageRef,
    pub build: bool,
    pub push: bool,
    pub app: ResourceName,
    pub names: ClusterNames,
    pub manifests_dir: PathBuf,
    pub secret_env_file: PathBuf,
    pub production_config: PathBuf,
    pub compose_file: Option<PathBuf>,
    pub build_context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    pub rollout_timeout: Duration,
    pub settle: Duration,
    pub health: HealthPolicy,
    pub log_tail_lines: u32,
}

impl RunConfig {
    /// Validate and merge options with settings. Relative paths are
    /// resolved against `project_dir`.
    pub fn resolve(options: RunOptions, settings: Settings, project_dir: &Path) -> Result<Self> {
        let image = ImageRef::new(
            options.registry.as_deref(),
            &options.image_name,
            options.tag.trim(),
        )
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        // Without a build nothing is pushed, so no registry is needed.
        if options.build && options.push && image.registry().is_none() {
            return Err(Error::InvalidConfig(
                "pushing requires a registry (set --registry or DOCKER_REGISTRY)".to_string(),
            ));
        }

        if settings.health.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "health.max_attempts must be at least 1".to_string(),
            ));
        }

        let app = match settings.name {
            Some(name) => name,
            None => ResourceName::from_image_name(image.name()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "cannot derive an application name from image '{}': {} (set `name` in {})",
                    image.name(),
                    e,
                    SETTINGS_FILENAME
                ))
            })?,
        };

        let target = match options.target {
            TargetKind::Cluster => {
                let namespace = match options.namespace.as_deref().map(str::trim) {
                    Some(ns) if !ns.is_empty() => {
                        ResourceName::new(ns).map_err(|e| Error::InvalidConfig(e.to_string()))?
                    }
                    _ => app.clone(),
                };
                DeployTarget::Cluster { namespace }
            }
            TargetKind::Local => DeployTarget::Local,
        };

        let secret = match settings.cluster.secret_name {
            Some(name) => name,
            None => ResourceName::new(&format!("{}-secrets", app))
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        };
        let names = ClusterNames {
            deployment: settings.cluster.deployment.unwrap_or_else(|| app.clone()),
            container: settings.cluster.container.unwrap_or_else(|| app.clone()),
            service: settings.cluster.service.unwrap_or_else(|| app.clone()),
            secret,
        };

        let paths = settings.paths;
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            environment: options.environment,
            target,
            image,
            build: options.build,
            push: options.push,
            app,
            names,
            manifests_dir: project_dir.join(paths.manifests),
            secret_env_file: project_dir.join(paths.secret_env_file),
            production_config: project_dir.join(paths.production_config),
            compose_file: paths.compose_file.map(|p| project_dir.join(p)),
            build_context: project_dir.join(settings.build.context),
            dockerfile: settings.build.dockerfile.map(|p| project_dir.join(p)),
            rollout_timeout: settings.cluster.rollout_timeout,
            settle: settings.local.settle,
            health: settings.health,
            log_tail_lines: settings.log_tail_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(options: RunOptions) -> Result<RunConfig> {
        RunConfig::resolve(options, Settings::default(), Path::new("/srv/app"))
    }

    #[test]
    fn defaults_target_cluster_in_app_namespace() {
        let config = resolve(RunOptions {
            image_name: "acme/transcriber".to_string(),
            ..RunOptions::default()
        })
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.app.as_str(), "transcriber");
        assert_eq!(
            config.target.namespace().map(ResourceName::as_str),
            Some("transcriber")
        );
        assert_eq!(config.names.secret.as_str(), "transcriber-secrets");
        assert_eq!(config.image.to_string(), "acme/transcriber:latest");
        assert!(config.build);
        assert!(!config.push);
    }

    #[test]
    fn explicit_namespace_wins() {
        let config = resolve(RunOptions {
            namespace: Some("payments".to_string()),
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(
            config.target,
            DeployTarget::Cluster {
                namespace: ResourceName::new("payments").unwrap()
            }
        );
    }

    #[test]
    fn local_target_has_no_namespace() {
        let config = resolve(RunOptions {
            target: TargetKind::Local,
            namespace: Some("ignored".to_string()),
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(config.target, DeployTarget::Local);
    }

    #[test]
    fn push_without_registry_is_rejected() {
        let err = resolve(RunOptions {
            push: true,
            ..RunOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("registry")));
    }

    #[test]
    fn push_flag_without_build_needs_no_registry() {
        let config = resolve(RunOptions {
            environment: Environment::Staging,
            build: false,
            push: true,
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(config.image.registry(), None);
        assert!(!config.build);
    }

    #[test]
    fn invalid_tag_is_rejected() {
        let err = resolve(RunOptions {
            tag: "v1/beta".to_string(),
            ..RunOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn zero_attempt_budget_is_rejected() {
        let mut settings = Settings::default();
        settings.health.max_attempts = 0;
        let err = RunConfig::resolve(RunOptions::default(), settings, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("max_attempts")));
    }

    #[test]
    fn paths_resolve_against_project_dir() {
        let config = resolve(RunOptions::default()).unwrap();
        assert_eq!(config.manifests_dir, PathBuf::from("/srv/app/k8s"));
        assert_eq!(
            config.production_config,
            PathBuf::from("/srv/app/.env.production")
        );
        assert_eq!(config.compose_file, None);
    }
}
