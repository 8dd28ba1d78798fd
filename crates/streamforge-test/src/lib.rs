//! Shared test fixtures for StreamForge crates.
//!
//! This crate provides plain data types and brute-force reference scores.
//! It does NOT depend on `streamforge-network`, which uses it as a
//! dev-dependency.
//!
//! - [`nqueens`] - queens with row and diagonal conflicts
//! - [`shift`] - employees and shifts for join, exists and grouping tests
//! - [`entity`] - minimal row entities for grouping tests
//! - [`logging`] - tracing subscriber initialisation for tests
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! streamforge-test = { workspace = true }
//! ```

pub mod entity;
pub mod logging;
pub mod nqueens;
pub mod shift;

pub use entity::RowEntity;
pub use logging::init_logging;
pub use nqueens::Queen;
pub use shift::{Employee, Shift};
