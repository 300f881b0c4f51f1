//! Deletion notifications

use serde::{Deserialize, Serialize};

use super::key::ResourceKey;
use super::object::Resource;

/// Payload of a delete notification
///
/// When the mirror saw the object disappear it delivers the last state it
/// held. When the deletion was only inferred (the object vanished between
/// two lists) the final state is unknown and a tombstone carries the key
/// plus whatever state was last cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeletedObject {
    Live(Resource),
    Tombstone {
        /// Rendered key of the deleted object
        key: String,
        /// Last state observed before the deletion, if any
        last_known: Option<Resource>,
    },
}

impl DeletedObject {
    /// Tombstone for an object whose final state was not observed
    pub fn tombstone(key: &ResourceKey, last_known: Option<Resource>) -> Self {
        Self::Tombstone { key: key.to_string(), last_known }
    }

    /// Best-known object state, if any
    pub fn object(&self) -> Option<&Resource> {
        match self {
            Self::Live(object) => Some(object),
            Self::Tombstone { last_known, .. } => last_known.as_ref(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tombstone_keeps_last_known_state() {
        let key = ResourceKey::new("ns", "a").unwrap();
        let tombstone = DeletedObject::tombstone(&key, Some(Resource::named("ns", "a")));

        assert!(tombstone.is_tombstone());
        assert_eq!(tombstone.object().map(Resource::name), Some("a"));
    }

    #[test]
    fn test_bare_tombstone_has_no_object() {
        let key = ResourceKey::cluster_scoped("node-a").unwrap();
        let tombstone = DeletedObject::tombstone(&key, None);
        assert!(tombstone.object().is_none());
    }
}
