//! Mock catalog transport for testing.

use async_trait::async_trait;
use bomgate::{
    CatalogTransport, Resource, ResourceChanges, ResourceId, ResourceItem, ResourceSummary,
    TransportError, UploadReport,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A scripted outcome consumed by the next call, whatever endpoint it hits.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Let the call through to the in-memory catalog
    Pass,
    /// Fail the call with this error
    Fail(TransportError),
}

/// In-memory catalog.
///
/// Resources live in a map keyed by normalized id. Calls first consume the
/// scripted response queue, then fall through to the map.
#[derive(Default)]
pub struct MockCatalog {
    resources: Mutex<HashMap<String, Resource>>,
    items: Mutex<HashMap<String, Vec<ResourceItem>>>,
    script: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    latency: Mutex<Duration>,
    items_latency: Mutex<Duration>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

#[allow(dead_code)]
impl MockCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding one resource per `(id, name)` pair.
    pub fn with_resources(entries: &[(&str, &str)]) -> Self {
        let catalog = Self::new();
        for (id, name) in entries {
            catalog.insert(Resource {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                item_count: 0,
                revision: 1,
            });
        }
        catalog
    }

    /// Add or replace a resource.
    pub fn insert(&self, resource: Resource) {
        let key = normalized(&resource.id);
        self.resources.lock().insert(key, resource);
    }

    /// Set the items of a resource.
    pub fn set_items(&self, id: &str, items: Vec<ResourceItem>) {
        self.items.lock().insert(normalized(id), items);
    }

    /// Queue scripted outcomes.
    pub fn script(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.script.lock().extend(responses);
    }

    /// Fail the next `count` calls with `error`.
    pub fn fail_next(&self, count: usize, error: TransportError) {
        self.script(std::iter::repeat_n(MockResponse::Fail(error), count));
    }

    /// Simulated time every call takes.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Extra simulated time for item listings.
    pub fn set_items_latency(&self, latency: Duration) {
        *self.items_latency.lock() = latency;
    }

    /// Calls made to `endpoint` so far.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls.lock().get(endpoint).copied().unwrap_or(0)
    }

    /// Calls made to any endpoint so far.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Most calls that were ever running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self, endpoint: &'static str, extra: Duration) -> Result<(), TransportError> {
        *self.calls.lock().entry(endpoint).or_insert(0) += 1;

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let latency = *self.latency.lock() + extra;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        match self.script.lock().pop_front() {
            Some(MockResponse::Fail(err)) => Err(err),
            Some(MockResponse::Pass) | None => Ok(()),
        }
    }

    fn lookup(&self, id: &ResourceId) -> Result<Resource, TransportError> {
        self.resources
            .lock()
            .get(id.normalized())
            .cloned()
            .ok_or_else(|| TransportError::status(404, format!("no resource '{}'", id)))
    }
}

fn normalized(id: &str) -> String {
    ResourceId::parse(id)
        .map(|id| id.normalized().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl CatalogTransport for MockCatalog {
    async fn list_resources(&self) -> Result<Vec<ResourceSummary>, TransportError> {
        self.enter("list_resources", Duration::ZERO).await?;
        let mut listing: Vec<_> = self
            .resources
            .lock()
            .values()
            .map(Resource::summary)
            .collect();
        listing.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listing)
    }

    async fn get_resource(&self, id: &ResourceId) -> Result<Resource, TransportError> {
        self.enter("get_resource", Duration::ZERO).await?;
        self.lookup(id)
    }

    async fn update_resource(
        &self,
        id: &ResourceId,
        changes: &ResourceChanges,
    ) -> Result<Resource, TransportError> {
        self.enter("update_resource", Duration::ZERO).await?;
        let mut resource = self.lookup(id)?;
        if let Some(name) = &changes.name {
            resource.name = name.clone();
        }
        if let Some(description) = &changes.description {
            resource.description = Some(description.clone());
        }
        resource.revision += 1;
        self.insert(resource.clone());
        Ok(resource)
    }

    async fn upload_resources(
        &self,
        parent_id: &ResourceId,
        items: &[ResourceItem],
    ) -> Result<UploadReport, TransportError> {
        self.enter("upload_resources", Duration::ZERO).await?;
        let mut resource = self.lookup(parent_id)?;

        let mut stored = self.items.lock();
        let existing = stored.entry(parent_id.normalized().to_string()).or_default();
        let mut report = UploadReport {
            parent_id: resource.id.clone(),
            ..UploadReport::default()
        };
        for item in items {
            match existing
                .iter_mut()
                .find(|known| known.part_number() == item.part_number())
            {
                Some(known) => {
                    *known = item.clone();
                    report.updated += 1;
                }
                None => {
                    existing.push(item.clone());
                    report.created += 1;
                }
            }
        }
        resource.item_count = existing.len() as u32;
        drop(stored);

        self.insert(resource);
        Ok(report)
    }

    async fn list_items(&self, id: &ResourceId) -> Result<Vec<ResourceItem>, TransportError> {
        let extra = *self.items_latency.lock();
        self.enter("list_items", extra).await?;
        self.lookup(id)?;
        Ok(self
            .items
            .lock()
            .get(id.normalized())
            .cloned()
            .unwrap_or_default())
    }
}
