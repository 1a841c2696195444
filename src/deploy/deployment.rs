// ABOUTME: Generic deployment struct parameterized by pipeline state.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::config::RunConfig;
use crate::health::HealthEndpoint;
use crate::types::ImageRef;

use super::state::{Deployed, ImageReady, Initialized, Verified};

/// A deployment run in progress, parameterized by its current state.
///
/// The configuration is borrowed for the whole run and never changes.
/// Steps are methods that consume `self` and return the next state, so
/// pushing before building or verifying before deploying does not compile.
#[derive(Debug)]
pub struct Deployment<'a, S> {
    pub(crate) config: &'a RunConfig,
    pub(crate) state: S,
}

impl<'a> Deployment<'a, Initialized> {
    pub fn new(config: &'a RunConfig) -> Self {
        Deployment {
            config,
            state: Initialized,
        }
    }
}

impl<'a, S> Deployment<'a, S> {
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Deployment<'_, ImageReady> {
    /// The image reference that will be rolled out.
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }
}

impl Deployment<'_, Deployed> {
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }
}

impl Deployment<'_, Verified> {
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }

    pub fn endpoint(&self) -> &HealthEndpoint {
        &self.state.endpoint
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub image: ImageRef,
    pub pushed: Vec<ImageRef>,
    pub endpoint: HealthEndpoint,
    pub health_attempts: u32,
    /// Pod or container listing; `None` if it could not be fetched.
    pub status: Option<String>,
}
