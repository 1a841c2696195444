// ABOUTME: Validated domain types shared across the deployment pipeline.
// ABOUTME: Image references and DNS-label resource names.

mod image_ref;
mod resource_name;

pub use image_ref::{ImageRef, ParseImageRefError, validate_tag};
pub use resource_name::{ResourceName, ResourceNameError};
