//! Named catalog operations built on the executor.

use crate::{CachePolicy, CatalogTransport, Gateway, soft_timeout};
use bomgate_core::{
    Resource, ResourceChanges, ResourceId, ResourceItem, ResourceOverview, ResourceSummary,
    UploadReport,
};
use bomgate_error::{GatewayResult, InvalidInputError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Cache keys of the named read operations.
///
/// Keys combine the operation name with the normalized identifier, so ids that
/// differ only in case, whitespace or punctuation share an entry.
pub mod cache_keys {
    use bomgate_core::ResourceId;

    /// Key of the resource listing.
    pub const LIST_RESOURCES: &str = "ListResources";

    /// Key of a single resource.
    pub fn resource(id: &ResourceId) -> String {
        format!("GetResource:{}", id.normalized())
    }

    /// Key of a resource's item listing.
    pub fn resource_items(id: &ResourceId) -> String {
        format!("ListResourceItems:{}", id.normalized())
    }

    /// Every key a write to `id` makes stale.
    pub fn touched_by_write(id: &ResourceId) -> [String; 3] {
        [
            resource(id),
            resource_items(id),
            LIST_RESOURCES.to_string(),
        ]
    }
}

/// Catalog client: the remote endpoints, routed through a [`Gateway`].
///
/// Reads are cached for the lifetimes configured under `[ttl]`; writes are
/// never cached and invalidate what they touch before they are sent.
///
/// # Example
///
/// ```rust,ignore
/// use bomgate::{CatalogClient, Gateway, GatewayConfig, ResourceChanges};
///
/// let client = CatalogClient::new(Gateway::new(GatewayConfig::load()?), transport);
///
/// let board = client.get_resource("BOM-12").await?;
/// client
///     .update_resource("BOM-12", &ResourceChanges::default().with_name("Amplifier rev B"))
///     .await?;
/// ```
#[derive(Debug)]
pub struct CatalogClient<T> {
    gateway: Gateway,
    transport: Arc<T>,
}

impl<T> Clone for CatalogClient<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: CatalogTransport> CatalogClient<T> {
    /// Route `transport` through `gateway`.
    pub fn new(gateway: Gateway, transport: T) -> Self {
        Self::from_shared(gateway, Arc::new(transport))
    }

    /// Route an already shared transport through `gateway`.
    pub fn from_shared(gateway: Gateway, transport: Arc<T>) -> Self {
        Self { gateway, transport }
    }

    /// The gateway every call goes through.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List every resource.
    #[instrument(skip(self))]
    pub async fn list_resources(&self) -> GatewayResult<Vec<ResourceSummary>> {
        let transport = &*self.transport;
        let policy = CachePolicy::new(cache_keys::LIST_RESOURCES, self.gateway.config().ttl.list());
        self.gateway
            .execute("ListResources", Some(policy), move || transport.list_resources())
            .await
    }

    /// Fetch one resource.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidInput` before any call if `id` is empty after
    /// normalization.
    #[instrument(skip(self))]
    pub async fn get_resource(&self, id: &str) -> GatewayResult<Resource> {
        let id = ResourceId::parse(id)?;
        self.fetch(&id).await
    }

    async fn fetch(&self, id: &ResourceId) -> GatewayResult<Resource> {
        let transport = &*self.transport;
        let policy = CachePolicy::new(cache_keys::resource(id), self.gateway.config().ttl.fetch());
        self.gateway
            .execute("GetResource", Some(policy), move || transport.get_resource(id))
            .await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidInput` for an empty id or an empty change set.
    #[instrument(skip(self, changes))]
    pub async fn update_resource(
        &self,
        id: &str,
        changes: &ResourceChanges,
    ) -> GatewayResult<Resource> {
        let id = ResourceId::parse(id)?;
        if changes.is_empty() {
            Err(InvalidInputError::new(format!(
                "no changes given for resource '{}'",
                id
            )))?
        }

        self.invalidate_for_write(&id);

        let transport = &*self.transport;
        let id = &id;
        let updated = self
            .gateway
            .execute("UpdateResource", None, move || {
                transport.update_resource(id, changes)
            })
            .await?;

        // Readers racing the write may have cached the old state.
        self.invalidate_for_write(id);
        Ok(updated)
    }

    /// Upload items into a parent resource.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidInput` for an empty parent id or no items.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn upload_resources(
        &self,
        parent_id: &str,
        items: &[ResourceItem],
    ) -> GatewayResult<UploadReport> {
        let parent = ResourceId::parse(parent_id)?;
        if items.is_empty() {
            Err(InvalidInputError::new(format!(
                "no items to upload into '{}'",
                parent
            )))?
        }

        self.invalidate_for_write(&parent);

        let transport = &*self.transport;
        let parent = &parent;
        let report = self
            .gateway
            .execute("UploadResources", None, move || {
                transport.upload_resources(parent, items)
            })
            .await?;

        self.invalidate_for_write(parent);
        Ok(report)
    }

    /// List the items of a resource.
    #[instrument(skip(self))]
    pub async fn list_resource_items(&self, id: &str) -> GatewayResult<Vec<ResourceItem>> {
        let id = ResourceId::parse(id)?;
        self.fetch_items(&id).await
    }

    async fn fetch_items(&self, id: &ResourceId) -> GatewayResult<Vec<ResourceItem>> {
        let transport = &*self.transport;
        let policy = CachePolicy::new(
            cache_keys::resource_items(id),
            self.gateway.config().ttl.items(),
        );
        self.gateway
            .execute("ListResourceItems", Some(policy), move || {
                transport.list_items(id)
            })
            .await
    }

    /// Fetch a resource together with its items.
    ///
    /// The resource is essential: if it cannot be fetched the overview fails.
    /// The item listing is not; if it fails or exceeds
    /// `ttl.overview_items_timeout_ms`, the overview comes back without items.
    #[instrument(skip(self))]
    pub async fn get_resource_overview(&self, id: &str) -> GatewayResult<ResourceOverview> {
        let id = ResourceId::parse(id)?;
        let resource = self.fetch(&id).await?;

        let limit = self.gateway.config().ttl.overview_items_timeout();
        let items = soft_timeout("ListResourceItems", limit, self.fetch_items(&id)).await;

        Ok(ResourceOverview::new(resource, items))
    }

    fn invalidate_for_write(&self, id: &ResourceId) {
        let removed = self
            .gateway
            .invalidate_many(cache_keys::touched_by_write(id));
        debug!(resource = %id, removed, "Invalidated cached reads");
    }
}

#[cfg(test)]
mod tests {
    use super::cache_keys;
    use bomgate_core::ResourceId;

    #[test]
    fn test_keys_use_normalized_id() {
        let a = ResourceId::parse(" BOM-12 ").unwrap();
        let b = ResourceId::parse("bom12").unwrap();
        assert_eq!(cache_keys::resource(&a), cache_keys::resource(&b));
        assert_eq!(cache_keys::resource(&a), "GetResource:bom12");
        assert_eq!(cache_keys::resource_items(&a), "ListResourceItems:bom12");
    }

    #[test]
    fn test_write_touches_list_entry() {
        let id = ResourceId::parse("BOM-7").unwrap();
        assert!(
            cache_keys::touched_by_write(&id)
                .iter()
                .any(|key| key == cache_keys::LIST_RESOURCES)
        );
    }
}
