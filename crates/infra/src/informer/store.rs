//! Thread-safe local copy of the listed objects

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use levelset_core::Mirror;
use levelset_domain::{Resource, ResourceKey, Result};
use parking_lot::RwLock;

/// Changes produced by replacing the store's contents with a fresh list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaceDelta {
    pub added: Vec<Resource>,
    /// Every object present before and after, as `(old, new)`, changed or not
    pub updated: Vec<(Resource, Resource)>,
    /// Objects that disappeared, with the last state this store saw
    pub removed: Vec<(ResourceKey, Resource)>,
}

impl ReplaceDelta {
    /// Updates whose resource version actually moved
    pub fn changed(&self) -> usize {
        self.updated
            .iter()
            .filter(|(old, new)| old.resource_version() != new.resource_version())
            .count()
    }
}

/// Keyed object store backing the controller's [`Mirror`]
#[derive(Debug, Default)]
pub struct MirrorStore {
    objects: RwLock<BTreeMap<ResourceKey, Resource>>,
    synced: AtomicBool,
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ResourceKey) -> Option<Resource> {
        self.objects.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn list(&self) -> Vec<Resource> {
        self.objects.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Swap in a complete listing and report what changed
    ///
    /// The swap happens under one write lock, so readers see either the old
    /// or the new contents.
    pub fn replace(&self, items: BTreeMap<ResourceKey, Resource>) -> ReplaceDelta {
        let mut objects = self.objects.write();
        let mut previous = std::mem::replace(&mut *objects, items);

        let mut delta = ReplaceDelta::default();
        for (key, object) in objects.iter() {
            match previous.remove(key) {
                Some(old) => delta.updated.push((old, object.clone())),
                None => delta.added.push(object.clone()),
            }
        }
        delta.removed = previous.into_iter().collect();
        delta
    }

    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }
}

impl Mirror for MirrorStore {
    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    fn get_by_key(&self, key: &ResourceKey) -> Result<Option<Resource>> {
        Ok(self.get(key))
    }
}
