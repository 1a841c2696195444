// ABOUTME: DNS-label names for cluster resources (namespaces, deployments, containers).
// ABOUTME: Ensures names follow RFC 1123 label requirements before any kubectl call.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("resource name cannot be empty")]
    Empty,

    #[error("resource name '{0}' exceeds maximum length of 63 characters")]
    TooLong(String),

    #[error("resource name '{0}' must start and end with an alphanumeric character")]
    BadEdge(String),

    #[error("resource name '{0}' must be lowercase")]
    NotLowercase(String),

    #[error("invalid character in resource name '{name}': '{ch}'")]
    InvalidChar { name: String, ch: char },
}

/// A validated Kubernetes-style resource name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(value: &str) -> Result<Self, ResourceNameError> {
        if value.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ResourceNameError::TooLong(value.to_string()));
        }

        if value.starts_with('-') || value.ends_with('-') {
            return Err(ResourceNameError::BadEdge(value.to_string()));
        }

        for ch in value.chars() {
            if ch.is_ascii_uppercase() {
                return Err(ResourceNameError::NotLowercase(value.to_string()));
            }
            if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
                return Err(ResourceNameError::InvalidChar {
                    name: value.to_string(),
                    ch,
                });
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Derive a name from an image name by taking its last path segment,
    /// lowercasing it and replacing characters a DNS label cannot hold.
    pub fn from_image_name(image_name: &str) -> Result<Self, ResourceNameError> {
        let segment = image_name.rsplit('/').next().unwrap_or(image_name);
        let cleaned: String = segment
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '.' { '-' } else { c })
            .collect();
        Self::new(cleaned.trim_matches('-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dns_labels() {
        assert_eq!(ResourceName::new("web-api-2").unwrap().as_str(), "web-api-2");
    }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(ResourceName::new(""), Err(ResourceNameError::Empty));
        assert!(matches!(
            ResourceName::new("-web"),
            Err(ResourceNameError::BadEdge(_))
        ));
        assert!(matches!(
            ResourceName::new("Web"),
            Err(ResourceNameError::NotLowercase(_))
        ));
        assert!(matches!(
            ResourceName::new("web_api"),
            Err(ResourceNameError::InvalidChar { ch: '_', .. })
        ));
        assert!(matches!(
            ResourceName::new(&"a".repeat(64)),
            Err(ResourceNameError::TooLong(_))
        ));
    }

    #[test]
    fn derives_from_image_name() {
        let name = ResourceName::from_image_name("acme/Transcriber_Service").unwrap();
        assert_eq!(name.as_str(), "transcriber-service");
    }
}
