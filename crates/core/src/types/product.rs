//! Catalog product type.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// An MCP product in the marketplace catalog.
///
/// Products are defined at build time and never mutated. A product with a
/// `target_address` is bought by transferring its price to the treasury; the
/// buyer receives the fixed address. Every other product is deployed from its
/// artifacts, and the buyer receives the freshly deployed contract address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique catalog key.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Icon glyph (an emoji).
    pub icon: String,
    /// Ordered feature bullets.
    pub features: Vec<String>,
    /// Highlighted orchestrator product.
    #[serde(default)]
    pub premium: bool,
    /// Fixed contract address handed out on purchase, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_address: Option<String>,
}

impl Product {
    /// Paths of the two deployment artifacts, relative to the artifact server.
    ///
    /// Returns `None` for products with a fixed target address; those are
    /// purchased, not deployed.
    #[must_use]
    pub fn artifacts(&self) -> Option<ArtifactPaths> {
        if self.target_address.is_some() {
            return None;
        }
        Some(ArtifactPaths {
            module: format!("{}.wasm", self.id),
            interface: format!("{}.widl", self.id),
        })
    }
}

/// The pair of files required to deploy a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Compiled module.
    pub module: String,
    /// Interface description.
    pub interface: String,
}
