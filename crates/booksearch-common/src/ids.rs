//! Identifier wrappers.

use serde::{Deserialize, Serialize};

/// Opaque identifier of an author, publisher or subject.
///
/// Produced by a first-tier listing and only ever passed back to the same
/// provider as the filter of a second-tier book listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_serializes_transparently() {
        let id = EntityId::new("joseph_conrad");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"joseph_conrad\"");

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::from("kaplan").to_string(), "kaplan");
    }
}
