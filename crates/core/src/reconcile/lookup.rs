//! Sample reconcile step: look the object up and report what was found

use async_trait::async_trait;
use levelset_domain::{Resource, ResourceKey};
use tracing::info;

use super::error::ReconcileError;
use super::ports::Reconciler;

/// Logs the current state of each key and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupReconciler;

#[async_trait]
impl Reconciler for LookupReconciler {
    async fn reconcile(
        &self,
        key: &ResourceKey,
        object: Option<Resource>,
    ) -> Result<(), ReconcileError> {
        match object {
            Some(object) => info!(
                %key,
                resource_version = object.resource_version(),
                "Sync/Add/Update for {}",
                object.name()
            ),
            None => info!(%key, "Object {key} does not exist anymore"),
        }
        Ok(())
    }
}
