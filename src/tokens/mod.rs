//! Token handling settings.
//!
//! Claim type remapping is configuration handed to collaborators when they
//! are constructed, never process-wide state.

pub mod claims;

pub use claims::{ClaimTypeMap, TokenHandlerSettings};
