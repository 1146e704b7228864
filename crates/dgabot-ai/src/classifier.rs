//! ONNX Runtime classifier for algorithmically generated domain names.
//!
//! Wraps a pretrained character-level model. Domains are encoded into
//! fixed-width ordinal rows (see [`dgabot_core::encode`]), stacked into one
//! `[batch, max_len]` tensor, and scored in a single forward pass.

use std::path::{Path, PathBuf};

use dgabot_core::{EncodedBatch, EncodingConfig, Prediction, encode_batch, read_domains};
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor, ValueType};
use tracing::{debug, info};

use crate::error::ClassifierError;
use crate::scores::scores_from_output;

/// Element type of the model's input tensor. Encoded rows are converted to it
/// before each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Int64,
    Int32,
    Float32,
}

impl InputKind {
    fn from_element_type(ty: TensorElementType) -> Option<Self> {
        match ty {
            TensorElementType::Int64 => Some(Self::Int64),
            TensorElementType::Int32 => Some(Self::Int32),
            TensorElementType::Float32 => Some(Self::Float32),
            _ => None,
        }
    }

    /// Whether `v` survives conversion to this element type unchanged.
    fn represents(self, v: i64) -> bool {
        match self {
            Self::Int64 => true,
            Self::Int32 => i32::try_from(v).is_ok(),
            // f32 has a 24-bit significand.
            Self::Float32 => v.unsigned_abs() <= 1 << 24,
        }
    }
}

/// Construction-time settings.
#[derive(Debug, Clone, Default)]
pub struct ClassifierOptions {
    pub encoding: EncodingConfig,
    /// Intra-op thread count for the runtime; `None` keeps its default.
    pub intra_threads: Option<usize>,
}

/// A loaded DGA model, ready for inference.
///
/// Loading is the expensive part; keep one instance around and call
/// [`predict`](Self::predict) repeatedly.
pub struct DgaClassifier {
    session: Session,
    input_name: String,
    input_kind: InputKind,
    encoding: EncodingConfig,
    model_path: PathBuf,
}

impl DgaClassifier {
    /// Load a model with the default 100-wide encoding.
    pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
        Self::load_with(model_path, ClassifierOptions::default())
    }

    pub fn load_with(model_path: &Path, options: ClassifierOptions) -> Result<Self, ClassifierError> {
        options.encoding.validate()?;
        if !model_path.is_file() {
            return Err(ClassifierError::model_load(model_path, "file not found"));
        }

        let mut builder = Session::builder().map_err(|e| ClassifierError::model_load(model_path, e))?;
        if let Some(threads) = options.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| ClassifierError::model_load(model_path, e))?;
        }
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::model_load(model_path, e))?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| ClassifierError::model_load(model_path, "model declares no inputs"))?;
        let input_name = input.name().to_string();
        let (input_kind, seq_len) = input_signature(input.dtype())
            .map_err(|reason| ClassifierError::model_load(model_path, reason))?;

        // Ordinals are at most 0x10FFFF and fit every kind; the sentinel is configurable.
        if !input_kind.represents(options.encoding.pad_value) {
            return Err(ClassifierError::model_load(
                model_path,
                format!(
                    "pad_value {} cannot be represented exactly by the model's {input_kind:?} input",
                    options.encoding.pad_value
                ),
            ));
        }

        if let Some(seq_len) = seq_len {
            if seq_len != options.encoding.max_len {
                return Err(ClassifierError::model_load(
                    model_path,
                    format!(
                        "model expects sequences of length {seq_len}, encoding is configured for {}",
                        options.encoding.max_len
                    ),
                ));
            }
        }

        match session.outputs().first().map(|output| output.dtype()) {
            Some(ValueType::Tensor {
                ty: TensorElementType::Float32,
                ..
            }) => {}
            other => {
                return Err(ClassifierError::model_load(
                    model_path,
                    format!("expected a float32 tensor output, found {other:?}"),
                ));
            }
        }

        info!(
            model = %model_path.display(),
            input = %input_name,
            kind = ?input_kind,
            max_len = options.encoding.max_len,
            "loaded DGA model"
        );
        Ok(Self {
            session,
            input_name,
            input_kind,
            encoding: options.encoding,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn encoding(&self) -> &EncodingConfig {
        &self.encoding
    }

    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Score each domain, returning one probability per input in input order.
    pub fn predict<S: AsRef<str>>(&mut self, domains: &[S]) -> Result<Vec<f32>, ClassifierError> {
        if domains.is_empty() {
            return Ok(vec![]);
        }
        let batch = encode_batch(domains, &self.encoding)?;
        self.run(batch)
    }

    /// Score every line of a domain file. The whole file is read before inference.
    pub fn predict_on_file(&mut self, path: &Path) -> Result<Vec<f32>, ClassifierError> {
        let domains = read_domains(path)?;
        self.predict(domains.as_slice())
    }

    /// Like [`predict`](Self::predict), pairing each score with its domain.
    pub fn classify<S: AsRef<str>>(&mut self, domains: &[S]) -> Result<Vec<Prediction>, ClassifierError> {
        let scores = self.predict(domains)?;
        Ok(Prediction::zip(domains, &scores))
    }

    /// Like [`predict_on_file`](Self::predict_on_file), pairing each score with its domain.
    pub fn classify_file(&mut self, path: &Path) -> Result<Vec<Prediction>, ClassifierError> {
        let domains = read_domains(path)?;
        self.classify(domains.as_slice())
    }

    fn run(&mut self, batch: EncodedBatch) -> Result<Vec<f32>, ClassifierError> {
        let rows = batch.rows();
        let shape = batch.shape();
        debug!(rows, width = batch.width(), input = %self.input_name, "running DGA model");

        let input: DynValue = match self.input_kind {
            InputKind::Int64 => {
                Tensor::from_array((shape, batch.into_vec().into_boxed_slice()))?.into_dyn()
            }
            InputKind::Int32 => {
                let data: Vec<i32> = batch.as_slice().iter().map(|&v| v as i32).collect();
                Tensor::from_array((shape, data.into_boxed_slice()))?.into_dyn()
            }
            InputKind::Float32 => {
                let data: Vec<f32> = batch.as_slice().iter().map(|&v| v as f32).collect();
                Tensor::from_array((shape, data.into_boxed_slice()))?.into_dyn()
            }
        };

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        scores_from_output(dims, output_data, rows)
    }
}

/// Element type and fixed sequence length (if declared) of a rank-2 input.
fn input_signature(dtype: &ValueType) -> Result<(InputKind, Option<usize>), String> {
    match dtype {
        ValueType::Tensor { ty, shape, .. } => {
            let kind = InputKind::from_element_type(*ty)
                .ok_or_else(|| format!("unsupported input element type {ty:?}"))?;
            if shape.len() != 2 {
                return Err(format!("expected a [batch, length] input, found shape {shape:?}"));
            }
            // Symbolic dimensions are reported as -1.
            let seq_len = (shape[1] > 0).then(|| shape[1] as usize);
            Ok((kind, seq_len))
        }
        other => Err(format!("expected a tensor input, found {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FLOAT, INT32, INT64, mean_model, row_mean_model, write_model};
    use dgabot_core::{InputError, OrdinalPolicy};
    use std::io::Write;

    /// Row mean of `google.com` post-padded to 100: (1002 - 90) / 100.
    const GOOGLE_MEAN: f32 = 9.12;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len(), "length mismatch: {actual:?} vs {expected:?}");
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-4, "score {i}: expected {e}, got {a}");
        }
    }

    #[test]
    fn load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = DgaClassifier::load(&dir.path().join("dga-bot.onnx")).err().unwrap();
        assert!(matches!(err, ClassifierError::ModelLoad { .. }), "got {err:?}");
    }

    #[test]
    fn load_malformed_model() {
        let file = write_model(b"definitely not a protobuf graph");
        let err = DgaClassifier::load(file.path()).err().unwrap();
        match err {
            ClassifierError::ModelLoad { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected ModelLoad, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_input_kind() {
        let file = row_mean_model();
        let classifier = DgaClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.input_kind(), InputKind::Int64);
        assert_eq!(classifier.encoding().max_len, 100);
        assert_eq!(classifier.model_path(), file.path());
    }

    #[test]
    fn predict_scores_each_row() {
        let file = row_mean_model();
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        let long = "a".repeat(150);
        let scores = classifier.predict(&["google.com", "", long.as_str()]).unwrap();
        assert_close(&scores, &[GOOGLE_MEAN, -1.0, 97.0]);
    }

    #[test]
    fn predict_preserves_order() {
        let file = row_mean_model();
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        let forward = classifier.predict(&["google.com", "zzz.net"]).unwrap();
        let reverse = classifier.predict(&["zzz.net", "google.com"]).unwrap();
        assert_eq!(forward.len(), 2);
        assert_close(&forward, &[reverse[1], reverse[0]]);
    }

    #[test]
    fn predict_empty_input() {
        let file = row_mean_model();
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        let scores = classifier.predict::<&str>(&[]).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn predict_on_file_matches_list() {
        let model = row_mean_model();
        let mut classifier = DgaClassifier::load(model.path()).unwrap();

        let mut domains = tempfile::NamedTempFile::new().unwrap();
        write!(domains, "google.com\nasdhcvuagq.com\n").unwrap();

        let from_file = classifier.predict_on_file(domains.path()).unwrap();
        let from_list = classifier.predict(&["google.com", "asdhcvuagq.com"]).unwrap();
        assert_eq!(from_file, from_list);
    }

    #[test]
    fn predict_on_missing_file() {
        let model = row_mean_model();
        let mut classifier = DgaClassifier::load(model.path()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = classifier.predict_on_file(&dir.path().join("sample_dga.txt")).unwrap_err();
        assert!(
            matches!(err, ClassifierError::Input(InputError::FileNotFound(_))),
            "got {err:?}"
        );
    }

    #[test]
    fn int32_and_float32_inputs() {
        for (elem, kind) in [(INT32, InputKind::Int32), (FLOAT, InputKind::Float32)] {
            let file = write_model(&mean_model(elem, None, true));
            let mut classifier = DgaClassifier::load(file.path()).unwrap();
            assert_eq!(classifier.input_kind(), kind);
            let scores = classifier.predict(&["google.com"]).unwrap();
            assert_close(&scores, &[GOOGLE_MEAN]);
        }
    }

    #[test]
    fn flat_output_accepted() {
        let file = write_model(&mean_model(INT64, None, false));
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        let scores = classifier.predict(&["google.com", ""]).unwrap();
        assert_close(&scores, &[GOOGLE_MEAN, -1.0]);
    }

    #[test]
    fn fixed_width_must_match_encoding() {
        let file = write_model(&mean_model(INT64, Some(64), true));
        let err = DgaClassifier::load(file.path()).err().unwrap();
        match err {
            ClassifierError::ModelLoad { reason, .. } => {
                assert!(reason.contains("64"), "reason: {reason}");
                assert!(reason.contains("100"), "reason: {reason}");
            }
            other => panic!("expected ModelLoad, got {other:?}"),
        }

        let options = ClassifierOptions {
            encoding: EncodingConfig {
                max_len: 64,
                ..Default::default()
            },
            intra_threads: Some(1),
        };
        let mut classifier = DgaClassifier::load_with(file.path(), options).unwrap();
        let scores = classifier.predict(&["a"]).unwrap();
        assert_close(&scores, &[(97.0 - 63.0) / 64.0]);
    }

    #[test]
    fn fixed_width_100_accepted() {
        let file = write_model(&mean_model(INT64, Some(100), true));
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        assert_close(&classifier.predict(&["google.com"]).unwrap(), &[GOOGLE_MEAN]);
    }

    #[test]
    fn pad_value_must_fit_input_kind() {
        let with_pad = |pad_value| ClassifierOptions {
            encoding: EncodingConfig {
                pad_value,
                ..Default::default()
            },
            intra_threads: None,
        };

        let int32 = write_model(&mean_model(INT32, None, true));
        let err = DgaClassifier::load_with(int32.path(), with_pad(4_294_967_295)).err().unwrap();
        match err {
            ClassifierError::ModelLoad { reason, .. } => {
                assert!(reason.contains("4294967295"), "reason: {reason}");
            }
            other => panic!("expected ModelLoad, got {other:?}"),
        }
        let mut classifier = DgaClassifier::load_with(int32.path(), with_pad(i32::MIN as i64)).unwrap();
        assert_eq!(classifier.predict(&["a"]).unwrap().len(), 1);

        let float32 = write_model(&mean_model(FLOAT, None, true));
        let err = DgaClassifier::load_with(float32.path(), with_pad((1 << 24) + 1)).err().unwrap();
        assert!(matches!(err, ClassifierError::ModelLoad { .. }), "got {err:?}");
        assert!(DgaClassifier::load_with(float32.path(), with_pad(-(1 << 24))).is_ok());

        let int64 = row_mean_model();
        assert!(DgaClassifier::load_with(int64.path(), with_pad(i64::MIN)).is_ok());
    }

    #[test]
    fn input_kind_exact_ranges() {
        assert!(InputKind::Int32.represents(i32::MAX as i64));
        assert!(!InputKind::Int32.represents(i32::MAX as i64 + 1));
        assert!(InputKind::Float32.represents(0x10FFFF));
        assert!(!InputKind::Float32.represents(-(1 << 24) - 1));
        assert!(InputKind::Int64.represents(i64::MAX));
    }

    #[test]
    fn reject_policy_surfaces_encoding_error() {
        let file = row_mean_model();
        let options = ClassifierOptions {
            encoding: EncodingConfig {
                ordinals: OrdinalPolicy::Reject,
                ..Default::default()
            },
            intra_threads: None,
        };
        let mut classifier = DgaClassifier::load_with(file.path(), options).unwrap();
        let err = classifier.predict(&["google.com", "bücher.de"]).unwrap_err();
        assert!(matches!(err, ClassifierError::Encoding(_)), "got {err:?}");
    }

    #[test]
    fn invalid_encoding_rejected_before_load() {
        let file = row_mean_model();
        let options = ClassifierOptions {
            encoding: EncodingConfig {
                max_len: 0,
                ..Default::default()
            },
            intra_threads: None,
        };
        let err = DgaClassifier::load_with(file.path(), options).err().unwrap();
        assert!(matches!(err, ClassifierError::Config(_)), "got {err:?}");
    }

    #[test]
    fn classify_pairs_domains() {
        let file = row_mean_model();
        let mut classifier = DgaClassifier::load(file.path()).unwrap();
        let predictions = classifier.classify(&["google.com", ""]).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].domain, "google.com");
        assert_eq!(predictions[1].domain, "");
        assert_close(
            &[predictions[0].probability, predictions[1].probability],
            &[GOOGLE_MEAN, -1.0],
        );
    }
}
