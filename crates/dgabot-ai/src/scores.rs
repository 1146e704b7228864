use crate::error::ClassifierError;

/// Flatten a model output into one score per input row.
///
/// Accepts `[rows]` and `[rows, 1]`. Anything else means the model is not a
/// single-probability classifier.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn scores_from_output(
    dims: &[i64],
    data: &[f32],
    rows: usize,
) -> Result<Vec<f32>, ClassifierError> {
    let shape_ok = match dims {
        [n] => *n as usize == rows,
        [n, 1] => *n as usize == rows,
        _ => false,
    };
    if !shape_ok || data.len() != rows {
        return Err(ClassifierError::OutputShape {
            expected: rows,
            actual: dims.to_vec(),
        });
    }
    Ok(data.to_vec())
}
