// ABOUTME: Optional deckhand.yml project settings for values that have no CLI flag.
// ABOUTME: Paths, cluster resource names, health policy and timings, all with defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::HealthPolicy;
use crate::error::{Error, Result};
use crate::types::ResourceName;

pub const SETTINGS_FILENAME: &str = "deckhand.yml";
pub const SETTINGS_FILENAME_ALT: &str = "deckhand.yaml";
pub const SETTINGS_FILENAME_DIR: &str = ".deckhand/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application name; defaults to the last segment of the image name.
    pub name: Option<ResourceName>,
    pub paths: PathSettings,
    pub build: BuildSettings,
    pub cluster: ClusterSettings,
    pub local: LocalSettings,
    pub health: HealthPolicy,
    /// Lines of target logs shown when health verification fails.
    pub log_tail_lines: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: None,
            paths: PathSettings::default(),
            build: BuildSettings::default(),
            cluster: ClusterSettings::default(),
            local: LocalSettings::default(),
            health: HealthPolicy::default(),
            log_tail_lines: 50,
        }
    }
}

/// Project-relative paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub manifests: PathBuf,
    pub secret_env_file: PathBuf,
    pub production_config: PathBuf,
    pub compose_file: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            manifests: PathBuf::from("k8s"),
            secret_env_file: PathBuf::from(".env"),
            production_config: PathBuf::from(".env.production"),
            compose_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            context: PathBuf::from("."),
            dockerfile: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub deployment: Option<ResourceName>,
    pub container: Option<ResourceName>,
    pub service: Option<ResourceName>,
    pub secret_name: Option<ResourceName>,
    #[serde(with = "humantime_serde")]
    pub rollout_timeout: Duration,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            deployment: None,
            container: None,
            service: None,
            secret_name: None,
            rollout_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    /// Pause after `docker compose up` before the first health probe.
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(10),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first settings file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(SETTINGS_FILENAME),
            dir.join(SETTINGS_FILENAME_ALT),
            dir.join(SETTINGS_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading settings");
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.log_tail_lines, 50);
        assert_eq!(settings.paths.manifests, PathBuf::from("k8s"));
        assert_eq!(settings.local.settle, Duration::from_secs(10));
        assert_eq!(settings.health.max_attempts, 30);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
name: transcriber
cluster:
  deployment: transcriber-api
  rollout_timeout: 2m
health:
  delay: 2s
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.name.unwrap().as_str(), "transcriber");
        assert_eq!(
            settings.cluster.deployment.unwrap().as_str(),
            "transcriber-api"
        );
        assert_eq!(settings.cluster.rollout_timeout, Duration::from_secs(120));
        assert_eq!(settings.cluster.container, None);
        assert_eq!(settings.health.delay, Duration::from_secs(2));
        assert_eq!(settings.health.port, 8080);
        assert_eq!(settings.health.path, "/health");
    }

    #[test]
    fn invalid_resource_name_is_rejected() {
        let err = Settings::from_yaml("name: Not_Valid\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
