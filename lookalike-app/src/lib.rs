//! Wiring and the fetch → normalize → fingerprint → score pipeline behind
//! the `lookalike` binary.

pub mod pipeline;
pub mod wiring;

pub use pipeline::PageSimilarity;
pub use wiring::{build_embedder, build_from_config};
