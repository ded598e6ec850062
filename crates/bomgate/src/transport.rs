//! The remote catalog service as seen by the gateway.

use async_trait::async_trait;
use bomgate_core::{
    Resource, ResourceChanges, ResourceId, ResourceItem, ResourceSummary, UploadReport,
};
use bomgate_error::TransportError;

/// One method per remote endpoint.
///
/// Implementations issue exactly one request per call and report failures as
/// [`TransportError`]s; retrying, pacing and caching are the gateway's job.
/// Status codes should be preserved so failures classify correctly.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// List all resources.
    async fn list_resources(&self) -> Result<Vec<ResourceSummary>, TransportError>;

    /// Fetch a single resource.
    async fn get_resource(&self, id: &ResourceId) -> Result<Resource, TransportError>;

    /// Apply a partial update and return the updated resource.
    async fn update_resource(
        &self,
        id: &ResourceId,
        changes: &ResourceChanges,
    ) -> Result<Resource, TransportError>;

    /// Upload items into a parent resource.
    async fn upload_resources(
        &self,
        parent_id: &ResourceId,
        items: &[ResourceItem],
    ) -> Result<UploadReport, TransportError>;

    /// List the items of a resource.
    async fn list_items(&self, id: &ResourceId) -> Result<Vec<ResourceItem>, TransportError>;
}
