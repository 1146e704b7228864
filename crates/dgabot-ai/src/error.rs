use std::path::PathBuf;

use dgabot_core::{ConfigError, EncodeError, InputError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("loading model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    Encoding(#[from] EncodeError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[cfg(feature = "onnx")]
    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("unexpected output shape {actual:?}, expected one score per row for {expected} rows")]
    OutputShape { expected: usize, actual: Vec<i64> },
}

impl ClassifierError {
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
