//! Resource records returned by the catalog service.

use crate::ResourceItem;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One row of the resource listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Remote identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Number of items the resource holds
    pub item_count: u32,
}

/// A full resource record.
///
/// # Examples
///
/// ```
/// use bomgate_core::Resource;
///
/// let resource = Resource {
///     id: "BOM-12".to_string(),
///     name: "Amplifier board".to_string(),
///     description: None,
///     item_count: 42,
///     revision: 3,
/// };
///
/// assert_eq!(resource.summary().item_count, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Remote identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of items the resource holds
    pub item_count: u32,
    /// Server-side revision counter
    pub revision: u32,
}

impl Resource {
    /// Listing view of this resource.
    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            item_count: self.item_count,
        }
    }
}

/// Partial update for a resource. Unset fields are left untouched.
///
/// # Examples
///
/// ```
/// use bomgate_core::ResourceChanges;
///
/// let changes = ResourceChanges::default().with_name("Amplifier rev B");
/// assert!(!changes.is_empty());
/// assert_eq!(changes.name.as_deref(), Some("Amplifier rev B"));
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct ResourceChanges {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceChanges {
    /// True when the change set would not modify anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// A resource together with its item listing.
///
/// `items` is `None` when the listing could not be fetched in time; the
/// resource itself is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ResourceOverview {
    resource: Resource,
    items: Option<Vec<ResourceItem>>,
}

impl ResourceOverview {
    /// Assemble an overview.
    pub fn new(resource: Resource, items: Option<Vec<ResourceItem>>) -> Self {
        Self { resource, items }
    }

    /// True when the item listing is missing.
    pub fn is_degraded(&self) -> bool {
        self.items.is_none()
    }
}
