//! Core types for the Icarus marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod price;
pub mod product;
pub mod purchase;
pub mod status;

pub use address::{AddressError, WalletAddress, shorten};
pub use id::*;
pub use price::{Price, Token};
pub use product::{ArtifactPaths, Product};
pub use purchase::{DeploymentResult, PurchaseRecord, UNKNOWN_ADDRESS};
pub use status::ConnectionStatus;
