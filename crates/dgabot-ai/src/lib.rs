//! DGA inference layer: ONNX Runtime session around a pretrained character-level classifier.

mod error;
mod scores;

pub use error::ClassifierError;

#[cfg(feature = "onnx")]
mod classifier;
#[cfg(feature = "onnx")]
pub use classifier::{ClassifierOptions, DgaClassifier, InputKind};

#[cfg(all(feature = "onnx", any(test, feature = "test-support")))]
pub mod test_support;
