//! Weft Render — sanitization, probing, and element resolution.
//!
//! This crate covers the stages of the pipeline that touch the outside
//! world:
//!
//! - [`sanitize`]: URL/reference validation
//! - [`assets`]: asset-root and remote-probe seams
//! - [`dimensions`]: intrinsic image dimension resolution
//! - [`resolver`]: tag-keyed element resolution registry
//! - [`pipeline`]: end-to-end facade over `weft-content` + this crate

#![doc = include_str!("../README.md")]

pub mod assets;
pub mod dimensions;
pub mod pipeline;
pub mod resolver;
pub mod sanitize;

// Re-export key types at crate root for convenience
pub use assets::{AssetRoot, DirAssetRoot, HttpProbe, RemoteProbe};
pub use dimensions::{DimensionResolver, Dimensions};
pub use pipeline::{Pipeline, RenderedDocument};
pub use resolver::{resolve_tree, ElementResolver, ResolveContext, Resolvers};
pub use sanitize::{sanitize_url, sanitize_url_value};
