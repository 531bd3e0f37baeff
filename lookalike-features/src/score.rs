use crate::PageFeatures;
use lookalike_common::{FeatureMethod, LookalikeError, Result};
use lookalike_config::SimilarityConfig;
use serde::Serialize;

/// Cosine similarity; 0 when either vector has zero norm.
///
/// ```
/// use lookalike_features::cosine;
/// assert!((cosine(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
/// ```
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// `1 - Σ|a-b| / Σmax(a,b)`; 0 when the denominator is 0.
pub fn overlap(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(LookalikeError::Invariant(format!(
            "cannot compare vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (mut diff, mut total) = (0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        diff += (x - y).abs();
        total += x.max(*y);
    }
    if total == 0.0 {
        return Ok(0.0);
    }
    Ok(1.0 - diff / total)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub similar: bool,
    pub score: f32,
}

impl Verdict {
    pub const DISSIMILAR: Verdict = Verdict {
        similar: false,
        score: 0.0,
    };
}

#[derive(Debug, Clone)]
pub struct Scorer {
    pub method: FeatureMethod,
    pub bow_threshold: f32,
    pub embedding_threshold: f32,
}

impl Scorer {
    pub fn from_config(cfg: &SimilarityConfig) -> Self {
        Self {
            method: cfg.method,
            bow_threshold: cfg.bow_threshold,
            embedding_threshold: cfg.embedding_threshold,
        }
    }

    /// Compare two fingerprints. The stylesheet vectors only matter when the
    /// tree vectors already agree.
    pub fn score(&self, a: &PageFeatures, b: &PageFeatures) -> Result<Verdict> {
        let (mut score, mut similar) = match self.method {
            FeatureMethod::Bow => {
                let s = overlap(&a.vector, &b.vector)?;
                (s, s >= self.bow_threshold)
            }
            FeatureMethod::PlainText | FeatureMethod::HtmlStructure => {
                let s = cosine(&a.vector, &b.vector);
                (s, s >= self.embedding_threshold)
            }
        };
        tracing::debug!(method = %self.method, score, similar, "features.score.primary");

        if similar {
            if let (Some(css_a), Some(css_b)) = (&a.css, &b.css) {
                let css_score = overlap(css_a, css_b)?;
                score = (score + css_score) / 2.0;
                if css_score < self.bow_threshold {
                    similar = false;
                }
                tracing::debug!(css_score, score, similar, "features.score.css");
            }
        }
        Ok(Verdict { similar, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(vector: Vec<f32>, css: Option<Vec<f32>>) -> PageFeatures {
        PageFeatures { vector, css }
    }

    fn scorer(method: FeatureMethod) -> Scorer {
        Scorer {
            method,
            bow_threshold: 0.8,
            embedding_threshold: 0.95,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine(&[3.0, 4.0], &[3.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn overlap_basics() {
        assert_eq!(overlap(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), 1.0);
        assert_eq!(overlap(&[0.0, 0.0], &[0.0, 0.0]).unwrap(), 0.0);
        assert!(overlap(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn bow_below_threshold_is_not_similar() {
        let v = scorer(FeatureMethod::Bow)
            .score(
                &features(vec![1.0, 2.0, 0.0], None),
                &features(vec![1.0, 1.0, 0.0], None),
            )
            .unwrap();
        assert!(!v.similar);
        assert!((v.score - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn identical_bow_vectors_are_similar() {
        let v = scorer(FeatureMethod::Bow)
            .score(
                &features(vec![2.0, 2.0, 0.0], None),
                &features(vec![2.0, 2.0, 0.0], None),
            )
            .unwrap();
        assert_eq!(v, Verdict { similar: true, score: 1.0 });
    }

    #[test]
    fn embedding_methods_use_cosine() {
        let v = scorer(FeatureMethod::HtmlStructure)
            .score(&features(vec![1.0, 0.0], None), &features(vec![1.0, 0.1], None))
            .unwrap();
        assert!(v.similar);
        assert!(v.score < 1.0);
    }

    #[test]
    fn diverging_css_downgrades_and_averages() {
        let v = scorer(FeatureMethod::Bow)
            .score(
                &features(vec![1.0, 1.0], Some(vec![1.0, 0.0])),
                &features(vec![1.0, 1.0], Some(vec![0.0, 1.0])),
            )
            .unwrap();
        assert!(!v.similar);
        assert_eq!(v.score, 0.5);
    }

    #[test]
    fn css_is_ignored_when_trees_already_differ() {
        let v = scorer(FeatureMethod::Bow)
            .score(
                &features(vec![1.0, 0.0], Some(vec![1.0])),
                &features(vec![0.0, 1.0], Some(vec![1.0])),
            )
            .unwrap();
        assert_eq!(v, Verdict::DISSIMILAR);
    }
}
