// ABOUTME: Container image reference assembly and validation.
// ABOUTME: Handles registry/name:tag references built from run configuration.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image tag '{0}' (must match [A-Za-z0-9_][A-Za-z0-9_.-]{{0,127}})")]
    InvalidTag(String),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

/// A fully tagged image reference: `[registry/]name:tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: String,
}

impl ImageRef {
    /// Assemble a reference from its parts.
    ///
    /// The registry may carry a port or a namespace path (`ghcr.io/acme`,
    /// `localhost:5000`); a trailing slash is ignored.
    pub fn new(registry: Option<&str>, name: &str, tag: &str) -> Result<Self, ParseImageRefError> {
        let registry = registry
            .map(|r| r.trim().trim_end_matches('/'))
            .filter(|r| !r.is_empty());
        let name = name.trim();

        if name.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(registry) = registry {
            check_chars(registry)?;
        }
        check_chars(name)?;
        if name.contains(':') {
            return Err(ParseImageRefError::InvalidFormat(name.to_string()));
        }
        validate_tag(tag)?;

        Ok(Self {
            registry: registry.map(str::to_string),
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Same repository, different tag.
    pub fn with_tag(&self, tag: &str) -> Result<Self, ParseImageRefError> {
        validate_tag(tag)?;
        Ok(Self {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: tag.to_string(),
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The reference without its tag.
    pub fn repository(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository(), self.tag)
    }
}

fn check_chars(input: &str) -> Result<(), ParseImageRefError> {
    for c in input.chars() {
        if !c.is_ascii_alphanumeric()
            && c != '/'
            && c != ':'
            && c != '.'
            && c != '-'
            && c != '_'
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }
    }
    Ok(())
}

/// Validate an OCI tag: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
pub fn validate_tag(tag: &str) -> Result<(), ParseImageRefError> {
    let mut chars = tag.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphanumeric() || first == '_')
                && tag.len() <= 128
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ParseImageRefError::InvalidTag(tag.to_string()))
    }
}
