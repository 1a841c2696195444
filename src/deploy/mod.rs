// ABOUTME: Deployment pipeline using the type state pattern.
// ABOUTME: Exports state types and the Deployment struct for compile-time ordered steps.

mod deployment;
mod state;
mod transitions;

pub use deployment::{Deployment, RunReport};
pub use state::{Deployed, ImageBuilt, ImageReady, Initialized, PrereqsChecked, Verified};
pub use transitions::TransitionResult;
