//! Purchase records and deployment outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Address recorded when a deployment was accepted but its response carried
/// no parseable address.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Outcome of a deployment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentResult {
    /// The provider reported the resulting address.
    Address(String),
    /// The call succeeded but no address could be derived from the response.
    Unknown,
}

impl DeploymentResult {
    /// The address to record, substituting [`UNKNOWN_ADDRESS`] when needed.
    #[must_use]
    pub fn into_address(self) -> String {
        match self {
            Self::Address(address) => address,
            Self::Unknown => UNKNOWN_ADDRESS.to_string(),
        }
    }

    /// Returns `true` if no address was derived.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// A product the connected wallet has bought.
///
/// Records are append-only: created after a successful deployment or
/// purchase, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Catalog product that was bought.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Product display name at purchase time.
    pub name: String,
    /// Deployed contract address, or the product's fixed address.
    pub address: String,
    /// Price paid, stored as a bare number.
    #[serde(with = "super::price::as_number")]
    pub price: Price,
    /// When the purchase completed.
    pub purchased_at: DateTime<Utc>,
}
