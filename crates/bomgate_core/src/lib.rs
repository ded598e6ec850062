//! Core data types for the bomgate catalog gateway.
//!
//! These are the shapes exchanged with the remote catalog/BOM service: resource
//! identifiers, resources and their summaries, change sets and uploaded items.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod item;
mod resource;

pub use id::ResourceId;
pub use item::{ResourceItem, ResourceItemBuilder, ResourceItemBuilderError, UploadReport};
pub use resource::{Resource, ResourceChanges, ResourceOverview, ResourceSummary};
