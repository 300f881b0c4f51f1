//! In-memory stand-ins for the controller's ports.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use levelset_core::{EventSource, Mirror, ReconcileError, Reconciler, ResourceEventHandler};
use levelset_domain::{
    ControllerConfig, DeletedObject, LevelsetError, Resource, ResourceKey, Result,
};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub fn key(namespace: &str, name: &str) -> ResourceKey {
    ResourceKey::new(namespace, name).unwrap()
}

/// Controller settings with the default retry limit and fast sync polling
pub fn controller_config(workers: usize) -> ControllerConfig {
    ControllerConfig { workers, ..ControllerConfig::default() }
}

/// Map-backed mirror with a manually driven sync flag
#[derive(Default)]
pub struct FakeMirror {
    objects: RwLock<HashMap<ResourceKey, Resource>>,
    broken: Mutex<HashSet<ResourceKey>>,
    synced: AtomicBool,
}

impl FakeMirror {
    pub fn synced() -> Arc<Self> {
        let mirror = Self::default();
        mirror.set_synced(true);
        Arc::new(mirror)
    }

    pub fn unsynced() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_synced(&self, synced: bool) {
        self.synced.store(synced, Ordering::SeqCst);
    }

    pub fn insert(&self, object: Resource) {
        let key = key(object.namespace(), object.name());
        self.objects.write().unwrap().insert(key, object);
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<Resource> {
        self.objects.write().unwrap().remove(key)
    }

    /// Make every lookup of `key` fail until [`FakeMirror::repair`]
    pub fn break_lookup(&self, key: &ResourceKey) {
        self.broken.lock().unwrap().insert(key.clone());
    }

    pub fn repair(&self, key: &ResourceKey) {
        self.broken.lock().unwrap().remove(key);
    }
}

impl Mirror for FakeMirror {
    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    fn get_by_key(&self, key: &ResourceKey) -> Result<Option<Resource>> {
        if self.broken.lock().unwrap().contains(key) {
            return Err(LevelsetError::Internal(format!("index unavailable for {key}")));
        }
        Ok(self.objects.read().unwrap().get(key).cloned())
    }
}

/// Event source whose notifications are fired by the test
#[derive(Default)]
pub struct FakeEventSource {
    handlers: Mutex<Vec<Arc<dyn ResourceEventHandler>>>,
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    pub fn add(&self, object: &Resource) {
        for handler in self.snapshot() {
            handler.on_add(object);
        }
    }

    pub fn update(&self, old: &Resource, new: &Resource) {
        for handler in self.snapshot() {
            handler.on_update(old, new);
        }
    }

    pub fn delete(&self, deleted: &DeletedObject) {
        for handler in self.snapshot() {
            handler.on_delete(deleted);
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn ResourceEventHandler>> {
        self.handlers.lock().unwrap().clone()
    }
}

impl EventSource for FakeEventSource {
    fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler>) {
        self.handlers.lock().unwrap().push(handler);
    }
}

/// Reconciler that records every call and fails or panics on request
#[derive(Default)]
pub struct ScriptedReconciler {
    calls: Mutex<Vec<(ResourceKey, Option<Resource>)>>,
    failures: Mutex<HashMap<ResourceKey, u32>>,
    panics: Mutex<HashSet<ResourceKey>>,
}

impl ScriptedReconciler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` reconciles of `key`
    pub fn fail(&self, key: &ResourceKey, times: u32) {
        self.failures.lock().unwrap().insert(key.clone(), times);
    }

    pub fn fail_always(&self, key: &ResourceKey) {
        self.fail(key, u32::MAX);
    }

    /// Panic on the next reconcile of `key`
    pub fn panic_once(&self, key: &ResourceKey) {
        self.panics.lock().unwrap().insert(key.clone());
    }

    pub fn calls(&self) -> Vec<(ResourceKey, Option<Resource>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, key: &ResourceKey) -> usize {
        self.calls.lock().unwrap().iter().filter(|(called, _)| called == key).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Reconciler for ScriptedReconciler {
    async fn reconcile(
        &self,
        key: &ResourceKey,
        object: Option<Resource>,
    ) -> std::result::Result<(), ReconcileError> {
        self.calls.lock().unwrap().push((key.clone(), object));

        let should_panic = self.panics.lock().unwrap().remove(key);
        if should_panic {
            panic!("scripted panic for {key}");
        }

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining = remaining.saturating_sub(1);
                Err(ReconcileError::failed(format!("scripted failure for {key}")))
            }
            _ => Ok(()),
        }
    }
}

/// Collects formatted log lines emitted on the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.buffer.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect()
    }

    /// Lines containing every fragment
    pub fn matching(&self, fragments: &[&str]) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| fragments.iter().all(|fragment| line.contains(fragment)))
            .collect()
    }
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.buffer))
    }
}
