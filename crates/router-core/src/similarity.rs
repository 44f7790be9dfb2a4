//! Cosine similarity over embedding vectors.

use crate::error::{RouterError, Result};

/// `s = (a·b) / (‖a‖·‖b‖)`, with `s := 0` if either norm is 0.
///
/// # Errors
/// Returns a validation error if the two vectors differ in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RouterError::validation(format!(
            "Cannot compute cosine similarity for vectors of different length ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Compute the similarity of `query` against every vector in `catalog`, in order.
pub fn compute_similarities(query: &[f32], catalog: &[&[f32]]) -> Result<Vec<f32>> {
    catalog.iter().map(|v| cosine_similarity(query, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_nonzero_vector_has_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn zero_vector_yields_zero_not_nan() {
        let zero = vec![0.0, 0.0, 0.0];
        let other = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &other).unwrap(), 0.0);
    }

    #[test]
    fn is_symmetric() {
        let a = vec![1.0, 2.0, -1.0];
        let b = vec![0.5, -3.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), cosine_similarity(&b, &a).unwrap());
    }

    #[test]
    fn mismatched_length_is_an_error() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn compute_similarities_preserves_order() {
        let query = vec![1.0, 0.0];
        let v1 = vec![1.0, 0.0];
        let v2 = vec![0.0, 1.0];
        let catalog: Vec<&[f32]> = vec![&v1, &v2];
        let scores = compute_similarities(&query, &catalog).unwrap();
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
    }
}
