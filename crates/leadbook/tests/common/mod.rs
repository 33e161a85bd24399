//! Shared test utilities for leadbook integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with a temp directory and database
//! - `RecordingStore` to observe duplicate lookups made by the ingestor
//! - Builders for CSV content and field mappings

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{RecordingStore, TestHarness};
