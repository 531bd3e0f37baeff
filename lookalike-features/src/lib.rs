//! Page fingerprints and their comparison.
//!
//! - [`bow`]: hashed bag of (tag, attribute, value) tokens
//! - [`text`]: whole rendered tree embedded in one call
//! - [`structure`]: subtree embeddings aggregated bottom-up
//! - [`css`]: hashed bag of stylesheet rules
//! - [`score`]: cosine/overlap metrics and the similarity verdict
//!
//! [`FeatureExtractor`] selects one of the tree fingerprints from
//! configuration.

pub mod bow;
pub mod css;
pub mod extractor;
pub mod score;
pub mod structure;
pub mod text;

pub use bow::BowExtractor;
pub use css::CssExtractor;
pub use extractor::{FeatureExtractor, PageFeatures};
pub use score::{cosine, overlap, Scorer, Verdict};
pub use structure::{EmbedUnit, StructureExtractor};
pub use text::TextExtractor;

/// Modulus applied to token hashes before bucketing.
const HASH_SPACE: u64 = 100_000_000;

/// Stable bucket of `token` in a vector of length `dim` (BLAKE3, first 8 bytes LE).
///
/// ```
/// let b = lookalike_features::bucket("div_class_card", 1024);
/// assert!(b < 1024);
/// assert_eq!(b, lookalike_features::bucket("div_class_card", 1024));
/// ```
pub fn bucket(token: &str, dim: usize) -> usize {
    let hash = blake3::hash(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    let folded = u64::from_le_bytes(prefix) % HASH_SPACE;
    (folded % dim.max(1) as u64) as usize
}
