#![deny(missing_docs)]

//! # pact-core — Foundational Types for the Pact Escrow
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies, only `serde` and
//! `thiserror` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A caller [`Address`] and an
//!    [`OrderId`] are distinct types; neither is a bare string or integer.
//!
//! 2. **[`Amount`] never overflows silently.** All arithmetic on value is
//!    checked and returns `Option`/`Result`; amounts serialize as decimal
//!    strings of the smallest unit so no precision is lost in JSON.
//!
//! 3. **[`ValidationError`]** is the single error type for malformed input,
//!    built with `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod amount;
pub mod error;
pub mod identity;

// Re-export primary types at crate root for ergonomic imports.
pub use amount::{Amount, WEI_PER_ETHER};
pub use error::ValidationError;
pub use identity::{Address, OrderId};
