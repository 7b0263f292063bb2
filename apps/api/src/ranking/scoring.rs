//! Similarity scoring — pluggable, trait-based scorer over embedding vectors.
//!
//! Default: `CosineScorer`, cosine similarity matching the metric the vector
//! index is created with. `AppState` holds an `Arc<dyn SimilarityScorer>` so
//! the backend can be swapped without touching the orchestrator.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("cannot score: {0}")]
    Unavailable(String),
}

/// The scorer contract: a symmetric similarity between two representations
/// of the same kind. Total over well-formed pairs; out-of-domain input fails
/// rather than returning a sentinel score, so callers can tell "low
/// similarity" from "could not score".
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    async fn score(&self, a: &[f32], b: &[f32]) -> Result<f32, ScoringError>;
}

/// Cosine similarity over embedding vectors. Deterministic, no model call.
pub struct CosineScorer;

#[async_trait]
impl SimilarityScorer for CosineScorer {
    async fn score(&self, a: &[f32], b: &[f32]) -> Result<f32, ScoringError> {
        cosine_similarity(a, b)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, ScoringError> {
    if a.is_empty() || b.is_empty() {
        return Err(ScoringError::Unavailable(
            "empty representation".to_string(),
        ));
    }
    if a.len() != b.len() {
        return Err(ScoringError::Unavailable(format!(
            "representations have different dimensions ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += f64::from(x) * f64::from(y);
        norm_a += f64::from(x) * f64::from(x);
        norm_b += f64::from(y) * f64::from(y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoringError::Unavailable(
            "zero-magnitude representation".to_string(),
        ));
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_one() {
        let v = vec![0.3, 0.4, 0.5];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_score_negative_one() {
        let score = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_invariance() {
        let a = vec![1.0, 2.0, 3.0];
        let b: Vec<f32> = a.iter().map(|x| x * 10.0).collect();
        let score = cosine_similarity(&a, &b).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_vector_is_unscorable() {
        let err = cosine_similarity(&[], &[1.0]).unwrap_err();
        assert!(matches!(err, ScoringError::Unavailable(_)));
    }

    #[test]
    fn test_dimension_mismatch_is_unscorable() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ScoringError::Unavailable(_)));
    }

    #[test]
    fn test_zero_magnitude_is_unscorable_not_a_sentinel() {
        let err = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ScoringError::Unavailable(_)));
    }

    #[test]
    fn test_score_is_finite_for_well_formed_input() {
        let score = cosine_similarity(&[1e-20, 1.0], &[1.0, 1e-20]).unwrap();
        assert!(score.is_finite());
    }
}
