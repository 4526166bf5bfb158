use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for IDs with phantom types.
///
/// Webhook deliveries and fixtures carry identifiers in several spellings
/// (dashed UUIDs, compact hex, opaque test ids such as `p1`), so an `Id`
/// accepts any non-blank string verbatim and only normalizes on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockMarker;

/// A page or database identifier.
pub type EntityId = Id<EntityMarker>;
pub type BlockId = Id<BlockMarker>;

impl<T> Id<T> {
    /// Parses an identifier, rejecting blank input.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        Ok(Self::new(trimmed))
    }

    /// Wraps a value without validation. Blocks in partial payloads may lack
    /// an id entirely; they still need a `BlockCommon`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Lowercased, hyphen-free form used in notion.so URLs.
    pub fn compact(&self) -> String {
        self.value.replace('-', "").to_lowercase()
    }

}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
