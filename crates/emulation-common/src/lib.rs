//! # emulation-common
//!
//! Shared types, error definitions, settings models, and constants
//! used across the entire emulation workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the compose generator
//! and the CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
