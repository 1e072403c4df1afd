//! Similarity metrics

use serde::{Deserialize, Serialize};

/// Similarity metric used to rank passages. Higher scores mean more relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity in `[-1, 1]`
    #[default]
    Cosine,
    /// Raw inner product, for embeddings that are already unit length
    DotProduct,
}

impl DistanceMetric {
    /// Similarity between a query and a stored vector.
    ///
    /// `query_norm` and `stored_norm` are the precomputed L2 norms. A zero-norm
    /// vector has cosine similarity 0 with everything.
    pub fn similarity(&self, query: &[f32], query_norm: f32, stored: &[f32], stored_norm: f32) -> f32 {
        let dot = dot(query, stored);
        match self {
            DistanceMetric::Cosine => {
                let denom = query_norm * stored_norm;
                if denom <= f32::EPSILON {
                    0.0
                } else {
                    (dot / denom).clamp(-1.0, 1.0)
                }
            }
            DistanceMetric::DotProduct => dot,
        }
    }
}

/// Inner product
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2 norm
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_bounds() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        let m = DistanceMetric::Cosine;
        assert!((m.similarity(&a, norm(&a), &a, norm(&a)) - 1.0).abs() < 1e-6);
        assert!((m.similarity(&a, norm(&a), &b, norm(&b)) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let a = [0.3, 0.4];
        let zero = [0.0, 0.0];
        assert_eq!(DistanceMetric::Cosine.similarity(&a, norm(&a), &zero, 0.0), 0.0);
    }
}
