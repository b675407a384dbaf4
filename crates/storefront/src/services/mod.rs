//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Purchase orchestration (duplicate check, in-flight guard,
//!   deployment, ledger record)

pub mod checkout;

pub use checkout::{CheckoutError, CheckoutService, InFlight};
