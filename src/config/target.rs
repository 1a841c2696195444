// ABOUTME: Deployment target selection: a Kubernetes cluster or a local Compose stack.
// ABOUTME: Exactly one variant is active per run and decides the deploy branch.

use clap::ValueEnum;
use std::fmt;

use crate::types::ResourceName;

/// Target kind as selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TargetKind {
    #[default]
    #[value(alias = "kubernetes", alias = "k8s")]
    Cluster,
    #[value(alias = "compose", alias = "docker-compose")]
    Local,
}

/// Where the service gets deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployTarget {
    /// Kubernetes cluster, scoped to one namespace.
    Cluster { namespace: ResourceName },
    /// The ambient local Compose stack.
    Local,
}

impl DeployTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            DeployTarget::Cluster { .. } => TargetKind::Cluster,
            DeployTarget::Local => TargetKind::Local,
        }
    }

    pub fn namespace(&self) -> Option<&ResourceName> {
        match self {
            DeployTarget::Cluster { namespace } => Some(namespace),
            DeployTarget::Local => None,
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployTarget::Cluster { namespace } => write!(f, "cluster (namespace {})", namespace),
            DeployTarget::Local => write!(f, "local compose stack"),
        }
    }
}
