//! Vector validation, normalization and wire rendering.

use std::borrow::Cow;
use std::fmt::Write;

use crate::error::{ClientError, Result};
use crate::types::Metric;

/// Scale `values` to unit L2 norm in place. Zero vectors are left unchanged.
///
/// The norm is accumulated in `f64`, where the square of any finite `f32`
/// neither overflows nor underflows.
pub fn l2_normalize(values: &mut [f32]) {
    let norm = values
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        for v in values.iter_mut() {
            *v = (f64::from(*v) / norm) as f32;
        }
    }
}

/// Check that a vector has the index dimension and only finite components.
pub fn validate(values: &[f32], dimension: usize) -> Result<()> {
    if values.len() != dimension {
        return Err(ClientError::DimensionMismatch {
            expected: dimension,
            actual: values.len(),
        });
    }
    check_finite(values)
}

/// Reject NaN and infinite components, which have no wire form.
pub fn check_finite(values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(ClientError::NonFiniteComponent {
            position,
            value: values[position],
        }),
        None => Ok(()),
    }
}

/// Validate a batch of vectors and apply the metric's normalization.
///
/// Euclidean vectors are borrowed as-is; angular vectors are copied and
/// normalized. Nothing is returned unless every vector passes.
pub fn prepare<'a>(
    vectors: &'a [Vec<f32>],
    dimension: usize,
    metric: Metric,
) -> Result<Cow<'a, [Vec<f32>]>> {
    for v in vectors {
        validate(v, dimension)?;
    }

    if !metric.requires_normalization() {
        return Ok(Cow::Borrowed(vectors));
    }

    let mut normalized = vectors.to_vec();
    for v in normalized.iter_mut() {
        l2_normalize(v);
    }
    Ok(Cow::Owned(normalized))
}

/// Append `[v1,v2,...,vn]` to `out`.
///
/// Components use the shortest decimal form that parses back to the same
/// `f32`. Callers must have checked finiteness, so the output is plain ASCII
/// without whitespace.
pub fn render_literal(values: &[f32], out: &mut String) {
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "{v}");
    }
    out.push(']');
}
