//! Icarus Market Core - Shared types library.
//!
//! This crate provides the domain types used across the marketplace:
//! - `storefront` - Catalog, wallet connection, and purchase flow
//! - `integration-tests` - End-to-end tests against a running storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no wallet provider calls,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, wallet addresses,
//!   purchase records, and connection status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
