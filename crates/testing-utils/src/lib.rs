//! # Nexus Testing Utils
//!
//! Shared test doubles for the hub crates.
//!
//! ```toml
//! [dev-dependencies]
//! nexus-testing-utils = { path = "../testing-utils" }
//! ```

pub mod helpers;
pub mod mocks;

pub use helpers::*;
pub use mocks::*;
