// ABOUTME: Pipeline state types for the type state pattern.
// ABOUTME: Each state carries what the earlier steps produced, so later steps cannot run without it.

use crate::health::HealthEndpoint;
use crate::image::BuiltImage;
use crate::types::ImageRef;

/// Configuration resolved, nothing checked yet.
/// Available actions: `check_prerequisites()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Tools and required files are present.
/// Available actions: `build_image()`, `skip_build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrereqsChecked;

/// The image was built under both tags.
/// Available actions: `push_image()`, `skip_push()`
#[derive(Debug, Clone)]
pub struct ImageBuilt {
    pub(crate) image: BuiltImage,
}

impl ImageBuilt {
    pub fn image(&self) -> &BuiltImage {
        &self.image
    }
}

/// The image to deploy is settled (built and maybe pushed, or taken as configured).
/// Available actions: `deploy()`
#[derive(Debug, Clone)]
pub struct ImageReady {
    pub(crate) image: ImageRef,
    pub(crate) pushed: Vec<ImageRef>,
}

/// The target accepted the image.
/// Available actions: `await_ready()`, `verify()`
#[derive(Debug, Clone)]
pub struct Deployed {
    pub(crate) image: ImageRef,
    pub(crate) pushed: Vec<ImageRef>,
}

/// The health endpoint answered.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Verified {
    pub(crate) image: ImageRef,
    pub(crate) pushed: Vec<ImageRef>,
    pub(crate) endpoint: HealthEndpoint,
    pub(crate) attempts: u32,
}
