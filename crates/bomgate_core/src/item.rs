//! Items uploaded into a resource.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A single line of a bill of materials.
///
/// # Examples
///
/// ```
/// use bomgate_core::ResourceItemBuilder;
///
/// let item = ResourceItemBuilder::default()
///     .part_number("RC0603-10K")
///     .quantity(4u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(item.part_number(), "RC0603-10K");
/// assert_eq!(*item.quantity(), 4);
/// assert!(item.description().is_none());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ResourceItem {
    /// Manufacturer or supplier part number
    part_number: String,
    /// Quantity per assembly
    quantity: u32,
    /// Optional human-readable description
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Outcome of an upload reported by the catalog service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReport {
    /// Parent resource that received the items
    pub parent_id: String,
    /// Items newly created
    pub created: u32,
    /// Items that replaced existing ones
    pub updated: u32,
    /// Part numbers the server rejected
    #[serde(default)]
    pub rejected: Vec<String>,
}
