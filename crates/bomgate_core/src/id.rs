//! Resource identifiers.

use bomgate_error::InvalidInputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a catalog resource (a BOM, a part list, a catalog entry).
///
/// Keeps the identifier as the caller spelled it, for sending to the remote
/// service, alongside a normalized form used to build cache keys. The normalized
/// form drops whitespace and punctuation and folds case, so `" BOM-12.a "` and
/// `"bom12A"` share one cache entry.
///
/// # Examples
///
/// ```
/// use bomgate_core::ResourceId;
///
/// let a = ResourceId::parse(" BOM-12.a ").unwrap();
/// let b = ResourceId::parse("bom12A").unwrap();
///
/// assert_eq!(a.as_str(), "BOM-12.a");
/// assert_eq!(a.normalized(), b.normalized());
/// assert!(ResourceId::parse(" -- ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    raw: String,
    normalized: String,
}

impl ResourceId {
    /// Parse an identifier, rejecting ones that normalize to nothing.
    #[track_caller]
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, InvalidInputError> {
        let raw = raw.as_ref().trim();
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(InvalidInputError::new(format!(
                "resource identifier '{}' is empty after normalization",
                raw
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            normalized,
        })
    }

    /// The identifier as supplied (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized identifier used for cache keys.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
