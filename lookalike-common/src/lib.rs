//! Common types and utilities shared across Lookalike crates.
//!
//! This crate defines the shared error type, the [`FeatureMethod`] selector
//! and observability helpers used throughout the Lookalike workspace. It is
//! intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`LookalikeError`] and [`Result`]: Shared error handling
//! - [`FeatureMethod`]: Which fingerprint a comparison is based on
//!
//! # Examples
//!
//! ```rust
//! use lookalike_common::FeatureMethod;
//!
//! let method: FeatureMethod = "html_structure".parse().unwrap();
//! assert!(method.needs_embeddings());
//! assert_eq!(method.as_str(), "html_structure");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Feature extraction method used to fingerprint a page.
///
/// The set is closed: unknown names are rejected when configuration is
/// loaded, never at comparison time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMethod {
    /// Hashed bag of (tag, attribute, value) tokens.
    Bow,
    /// Whole rendered tree sent to the embedding service.
    PlainText,
    /// Subtree embeddings aggregated bottom-up.
    HtmlStructure,
}

impl FeatureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureMethod::Bow => "bow",
            FeatureMethod::PlainText => "plain_text",
            FeatureMethod::HtmlStructure => "html_structure",
        }
    }

    /// Whether this method requires an embedding service.
    pub fn needs_embeddings(&self) -> bool {
        !matches!(self, FeatureMethod::Bow)
    }
}

impl fmt::Display for FeatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureMethod {
    type Err = LookalikeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "bow" => Ok(FeatureMethod::Bow),
            "plain_text" => Ok(FeatureMethod::PlainText),
            "html_structure" => Ok(FeatureMethod::HtmlStructure),
            other => Err(LookalikeError::Config(format!(
                "embedding method {other} not defined"
            ))),
        }
    }
}

/// Error types used across the Lookalike system.
#[derive(thiserror::Error, Debug)]
pub enum LookalikeError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page or stylesheet could not be retrieved.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The embedding service failed or returned an unusable response.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A structural invariant of the feature pipeline was violated.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,

    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`LookalikeError`].
pub type Result<T> = std::result::Result<T, LookalikeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods() {
        assert_eq!("bow".parse::<FeatureMethod>().unwrap(), FeatureMethod::Bow);
        assert_eq!(
            " plain_text ".parse::<FeatureMethod>().unwrap(),
            FeatureMethod::PlainText
        );
        assert!(!FeatureMethod::Bow.needs_embeddings());
    }

    #[test]
    fn unknown_method_is_a_config_error() {
        let err = "tfidf".parse::<FeatureMethod>().unwrap_err();
        assert!(matches!(err, LookalikeError::Config(_)));
        assert!(err.to_string().contains("tfidf"));
    }
}
