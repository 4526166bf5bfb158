// src/types/domain_types.rs
//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Validated URL type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

// Manual Serialize/Deserialize implementation for Url
impl Serialize for ValidatedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidatedUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ValidatedUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl ValidatedUrl {
    /// Create a new validated URL
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        match Url::parse(url) {
            Ok(parsed_url) => {
                if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
                    return Err(ValidationError::InvalidUrl {
                        url: url.to_string(),
                        reason: "Only HTTP and HTTPS URLs are supported".to_string(),
                    });
                }
                Ok(Self(parsed_url))
            }
            Err(e) => Err(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Get the URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The URL as a prefix that always ends in `/`, ready for a path segment.
    pub fn as_base(&self) -> String {
        let s = self.0.as_str();
        if s.ends_with('/') {
            s.to_string()
        } else {
            format!("{}/", s)
        }
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
