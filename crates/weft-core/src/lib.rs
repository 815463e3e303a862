//! Weft Core — shared types, errors, and utilities.
//!
//! This crate provides the foundational types used across all Weft crates.
//! It has no internal Weft dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`value`]: Typed metadata values
//! - [`util`]: Slug and title utilities

#![doc = include_str!("../README.md")]

pub mod error;
pub mod util;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use value::MetaValue;

// Convenience re-exports from util
pub use util::slug::{slugify, title_from_stem};
