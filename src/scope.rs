//! Sync scope identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one independently synced dataset slice: `(product, version, format)`.
///
/// Used as the lookup key into persisted sync state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Product name, e.g. `maastotietokanta`.
    pub product: String,
    /// Product version, e.g. `1`.
    pub version: String,
    /// Distribution format, e.g. `gml`.
    pub format: String,
}

impl ScopeKey {
    /// Creates a scope key.
    #[must_use]
    pub fn new(
        product: impl Into<String>,
        version: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
            format: format.into(),
        }
    }

    /// Returns the name of the first blank component, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("product", &self.product),
            ("version", &self.version),
            ("format", &self.format),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.product, self.version, self.format)
    }
}
