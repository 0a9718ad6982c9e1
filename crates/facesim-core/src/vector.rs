//! Vector math for face embeddings
//!
//! Normalization to unit length, the Euclidean distance score reported to
//! callers, and the strict text codec used for stored vectors.

use crate::error::{FaceError, FaceResult};

/// Upper bound of the distance between two unit vectors
pub const MAX_DISTANCE: f32 = 2.0;

/// Euclidean norm of a vector, accumulated in f64
pub fn l2_norm(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|&v| (v as f64) * (v as f64))
        .sum::<f64>()
        .sqrt()
}

/// Rescales a vector to unit Euclidean length.
///
/// Fails with [`FaceError::DegenerateVector`] when the norm is zero or not
/// finite, which also covers empty input and NaN/infinite components.
pub fn normalize(vector: &[f32]) -> FaceResult<Vec<f32>> {
    let norm = l2_norm(vector);
    if norm == 0.0 || !norm.is_finite() {
        return Err(FaceError::DegenerateVector);
    }

    Ok(vector.iter().map(|&v| ((v as f64) / norm) as f32).collect())
}

/// Distance between two raw embeddings.
///
/// Both vectors are normalized first, so the result lies in `[0, 2]`.
/// Lower means more similar.
pub fn distance(a: &[f32], b: &[f32]) -> FaceResult<f32> {
    if a.len() != b.len() {
        return Err(FaceError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let a = normalize(a)?;
    let b = normalize(b)?;
    Ok(distance_between_unit(&a, &b))
}

/// Euclidean distance between two vectors that are already unit length.
///
/// Callers must ensure equal lengths.
pub fn distance_between_unit(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();

    (sum.sqrt() as f32).clamp(0.0, MAX_DISTANCE)
}

/// Parses the text form of a stored vector.
///
/// Accepts a bracketed, comma-separated list of finite numbers, either
/// pgvector style (`[1,2,3]`) or Postgres array style (`{1,2,3}`).
pub fn parse_vector(text: &str) -> FaceResult<Vec<f32>> {
    let trimmed = text.trim();

    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| {
            trimmed
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
        })
        .ok_or_else(|| FaceError::MalformedVector("missing enclosing brackets".to_string()))?;

    if inner.trim().is_empty() {
        return Err(FaceError::MalformedVector("empty vector".to_string()));
    }

    inner
        .split(',')
        .enumerate()
        .map(|(i, item)| {
            let item = item.trim();
            let value: f32 = item.parse().map_err(|_| {
                FaceError::MalformedVector(format!("invalid number at position {}", i))
            })?;
            if !value.is_finite() {
                return Err(FaceError::MalformedVector(format!(
                    "non-finite number at position {}",
                    i
                )));
            }
            Ok(value)
        })
        .collect()
}

/// Formats a vector as a pgvector text literal (`[1,2,3]`)
pub fn format_vector(vector: &[f32]) -> String {
    let items: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(","))
}
