//! Shared test utilities for cliparchive integration tests.
//!
//! This module provides:
//! - `TestHarness` with a file-backed archive in a temp directory
//! - Builders for configs and match records

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
