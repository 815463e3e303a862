//! Shared utilities.
//!
//! - [`slug`]: Slug derivation and title reconstruction

pub mod slug;
