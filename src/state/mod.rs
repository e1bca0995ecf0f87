//! State module for tracking relay validation
//!
//! # Components
//!
//! - `Validation`: whether a relay task passed address and DNS screening
//! - `RejectReason`: why an address was refused, with its persisted reason string

mod validation;

// Re-export main types
pub use validation::{RejectReason, Validation};
