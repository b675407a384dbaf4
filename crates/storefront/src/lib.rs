//! Icarus Market Storefront library.
//!
//! The MCP marketplace: a catalog of deployable MCP servers, a wallet
//! connection protocol, contract deployment, and a per-wallet purchase
//! ledger. Exposed as a library so the binary and the integration tests
//! share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod weil;
