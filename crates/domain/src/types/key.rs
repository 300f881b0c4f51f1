//! Resource keys and the functions that derive them
//!
//! A key is the only thing the work queue carries. Workers look the current
//! object up by key, so a key must identify an object without holding it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::event::DeletedObject;
use super::object::Resource;
use crate::errors::{LevelsetError, Result};

/// `namespace/name`, or `name` for cluster-scoped resources
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    namespace: String,
    name: String,
}

impl ResourceKey {
    /// Build a key, rejecting an empty name or a `/` in either part
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();

        if name.is_empty() {
            return Err(LevelsetError::Malformed("resource key has an empty name".to_string()));
        }
        if namespace.contains('/') || name.contains('/') {
            return Err(LevelsetError::Malformed(format!(
                "resource key parts may not contain '/': {namespace:?}, {name:?}"
            )));
        }

        Ok(Self { namespace, name })
    }

    /// Key of a cluster-scoped resource
    pub fn cluster_scoped(name: impl Into<String>) -> Result<Self> {
        Self::new(String::new(), name)
    }

    /// Namespace, empty for cluster-scoped resources
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

impl FromStr for ResourceKey {
    type Err = LevelsetError;

    fn from_str(key: &str) -> Result<Self> {
        let (namespace, name) = split_meta_namespace_key(key)?;
        Self::new(namespace, name)
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = LevelsetError;

    fn try_from(key: String) -> Result<Self> {
        key.parse()
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}

/// Split a rendered key into `(namespace, name)`
///
/// # Errors
/// Returns `LevelsetError::Malformed` if the key has more than one `/`.
pub fn split_meta_namespace_key(key: &str) -> Result<(&str, &str)> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => Ok(("", name)),
        (Some(namespace), Some(name), None) => Ok((namespace, name)),
        _ => Err(LevelsetError::Malformed(format!("unexpected key format: {key:?}"))),
    }
}

/// Key of a live object
///
/// # Errors
/// Returns `LevelsetError::Malformed` if the object has no name.
pub fn meta_namespace_key_func(object: &Resource) -> Result<ResourceKey> {
    if object.metadata.name.is_empty() {
        return Err(LevelsetError::Malformed(format!(
            "object in namespace {:?} has no name",
            object.metadata.namespace
        )));
    }
    ResourceKey::new(object.metadata.namespace.clone(), object.metadata.name.clone())
}

/// Key of a deletion notification
///
/// Tombstones already carry the key recorded when the object was last seen,
/// so this never needs the final object state.
///
/// # Errors
/// Returns `LevelsetError::Malformed` if the live object has no name or the
/// tombstone key cannot be parsed.
pub fn deletion_handling_key_func(deleted: &DeletedObject) -> Result<ResourceKey> {
    match deleted {
        DeletedObject::Live(object) => meta_namespace_key_func(object),
        DeletedObject::Tombstone { key, .. } => key.parse(),
    }
}
