// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Every flag falls back to an environment variable, then to a built-in default.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use crate::config::{DEFAULT_IMAGE_NAME, DEFAULT_IMAGE_TAG, Environment, RunOptions, TargetKind};
use crate::output::OutputMode;

#[derive(Debug, Parser)]
#[command(name = "deckhand")]
#[command(about = "Build, push, deploy and health-check a containerized service")]
#[command(version)]
pub struct Cli {
    /// Deployment environment
    #[arg(short, long, env = "ENVIRONMENT", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// Image tag to build and deploy
    #[arg(short, long, env = "IMAGE_TAG", default_value = DEFAULT_IMAGE_TAG)]
    pub tag: String,

    /// Where to deploy
    #[arg(long, env = "DEPLOY_TARGET", value_enum, default_value_t = TargetKind::Cluster)]
    pub target: TargetKind,

    /// Kubernetes namespace (defaults to the application name)
    #[arg(short, long, env = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Registry host and path the image is pushed to
    #[arg(long, env = "DOCKER_REGISTRY")]
    pub registry: Option<String>,

    /// Image repository name
    #[arg(long, env = "IMAGE_NAME", default_value = DEFAULT_IMAGE_NAME)]
    pub image_name: String,

    /// Build the image before deploying
    #[arg(
        long,
        env = "BUILD_IMAGE",
        value_name = "BOOL",
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub build: bool,

    /// Push the built image to the registry
    #[arg(
        long,
        env = "PUSH_IMAGE",
        value_name = "BOOL",
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub push: bool,

    /// Settings file (default: deckhand.yml in the current directory, if present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings, errors and the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print progress as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            environment: self.environment,
            tag: self.tag.clone(),
            target: self.target,
            namespace: self.namespace.clone(),
            registry: self.registry.clone(),
            image_name: self.image_name.clone(),
            build: self.build,
            push: self.push,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_build_flag_means_true() {
        let cli = Cli::try_parse_from(["deckhand", "--build", "--push"]).unwrap();
        assert!(cli.build);
        assert!(cli.push);
    }

    #[test]
    fn build_flag_takes_explicit_false() {
        let cli = Cli::try_parse_from(["deckhand", "--build", "false"]).unwrap();
        assert!(!cli.build);
    }

    #[test]
    fn quiet_and_json_conflict() {
        assert!(Cli::try_parse_from(["deckhand", "--quiet", "--json"]).is_err());
    }
}
