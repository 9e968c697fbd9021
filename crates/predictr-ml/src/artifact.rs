//! JSON codec for trained models.
//!
//! Decoding classifies failures structurally: bytes that are not JSON are
//! [`ArtifactError::Corrupt`]; a readable file written under another format
//! version or with dimensions that do not fit together is a compatibility
//! error, which callers fix by retraining.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

use crate::model::{DenseHead, LstmLayer, SequenceRegressor};

/// Bumped whenever the stored layout or network semantics change.
pub const FORMAT_VERSION: u32 = 1;

const MODEL_KIND: &str = "stacked_lstm";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("artifact format version {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("artifact shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("artifact is corrupt: {0}")]
    Corrupt(String),
}

impl ArtifactError {
    pub const fn is_compatibility(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. } | Self::ShapeMismatch(_))
    }
}

/// A trained network plus the window length it expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub symbol: String,
    pub time_steps: u32,
    pub model: SequenceRegressor,
}

#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    format_version: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    kind: String,
    symbol: String,
    time_steps: u32,
    layers: Vec<StoredLayer>,
    head: StoredHead,
}

#[derive(Serialize, Deserialize)]
struct StoredLayer {
    input_size: usize,
    hidden_size: usize,
    /// Row-major `(4 * hidden_size, input_size + hidden_size)`.
    weights: Vec<f64>,
    bias: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct StoredHead {
    weights: Vec<f64>,
    bias: f64,
}

pub fn encode(artifact: &ModelArtifact) -> Result<Vec<u8>, ArtifactError> {
    let layers: Vec<StoredLayer> = artifact
        .model
        .layers()
        .iter()
        .map(|layer| StoredLayer {
            input_size: layer.input_size(),
            hidden_size: layer.hidden_size(),
            weights: layer.weights().iter().copied().collect(),
            bias: layer.bias().to_vec(),
        })
        .collect();
    let head = StoredHead {
        weights: artifact.model.head().weights().to_vec(),
        bias: artifact.model.head().bias(),
    };

    let finite = layers
        .iter()
        .flat_map(|layer| layer.weights.iter().chain(&layer.bias))
        .chain(&head.weights)
        .chain(std::iter::once(&head.bias))
        .all(|v| v.is_finite());
    if !finite {
        return Err(ArtifactError::Corrupt(String::from(
            "model weights are not finite",
        )));
    }

    let file = ArtifactFile {
        format_version: FORMAT_VERSION,
        kind: String::from(MODEL_KIND),
        symbol: artifact.symbol.clone(),
        time_steps: artifact.time_steps,
        layers,
        head,
    };
    serde_json::to_vec(&file).map_err(|e| ArtifactError::Corrupt(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<ModelArtifact, ArtifactError> {
    let header: Header =
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Corrupt(e.to_string()))?;
    let found = header.format_version.unwrap_or(0);
    if found != FORMAT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            expected: FORMAT_VERSION,
            found,
        });
    }

    let file: ArtifactFile = serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        Category::Data => ArtifactError::ShapeMismatch(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => ArtifactError::Corrupt(e.to_string()),
    })?;

    if file.kind != MODEL_KIND {
        return Err(ArtifactError::ShapeMismatch(format!(
            "unsupported model kind '{}'",
            file.kind
        )));
    }
    if file.time_steps == 0 {
        return Err(ArtifactError::ShapeMismatch(String::from(
            "time_steps must be at least 1",
        )));
    }

    let mut layers = Vec::with_capacity(file.layers.len());
    for (index, stored) in file.layers.into_iter().enumerate() {
        layers.push(restore_layer(index, stored)?);
    }
    let head = DenseHead::from_parameters(Array1::from(file.head.weights), file.head.bias);
    let model = SequenceRegressor::from_parts(layers, head).ok_or_else(|| {
        ArtifactError::ShapeMismatch(String::from("layers and head do not chain"))
    })?;

    Ok(ModelArtifact {
        symbol: file.symbol,
        time_steps: file.time_steps,
        model,
    })
}

fn restore_layer(index: usize, stored: StoredLayer) -> Result<LstmLayer, ArtifactError> {
    let rows = 4 * stored.hidden_size;
    let cols = stored.input_size + stored.hidden_size;
    let weights = Array2::from_shape_vec((rows, cols), stored.weights).map_err(|_| {
        ArtifactError::ShapeMismatch(format!("layer {index}: weights are not {rows}x{cols}"))
    })?;
    LstmLayer::from_parameters(
        stored.input_size,
        stored.hidden_size,
        weights,
        Array1::from(stored.bias),
    )
    .ok_or_else(|| ArtifactError::ShapeMismatch(format!("layer {index}: bias length mismatch")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::Value;

    fn artifact() -> ModelArtifact {
        let mut rng = StdRng::seed_from_u64(21);
        ModelArtifact {
            symbol: String::from("AAPL"),
            time_steps: 8,
            model: SequenceRegressor::new(3, 2, &mut rng),
        }
    }

    fn mutate(bytes: &[u8], edit: impl FnOnce(&mut Value)) -> Vec<u8> {
        let mut json: Value = serde_json::from_slice(bytes).expect("json");
        edit(&mut json);
        serde_json::to_vec(&json).expect("encode")
    }

    #[test]
    fn decoded_model_predicts_like_the_original() {
        let original = artifact();
        let decoded = decode(&encode(&original).expect("encode")).expect("decode");

        let window = [0.1, 0.2, 0.3, 0.35, 0.3, 0.4, 0.5, 0.45];
        assert_eq!(decoded.time_steps, 8);
        let restored = decoded.model.predict_next(&window);
        let expected = original.model.predict_next(&window);
        assert!((restored - expected).abs() < 1e-12);
    }

    #[test]
    fn other_format_versions_are_incompatible() {
        let bytes = mutate(&encode(&artifact()).expect("encode"), |json| {
            json["format_version"] = Value::from(FORMAT_VERSION + 1);
        });
        let error = decode(&bytes).expect_err("version mismatch");
        assert!(matches!(error, ArtifactError::VersionMismatch { .. }));
        assert!(error.is_compatibility());

        let legacy = mutate(&encode(&artifact()).expect("encode"), |json| {
            if let Some(map) = json.as_object_mut() {
                map.remove("format_version");
            }
        });
        assert_eq!(
            decode(&legacy),
            Err(ArtifactError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: 0
            })
        );
    }

    #[test]
    fn truncated_weights_are_a_shape_mismatch() {
        let bytes = mutate(&encode(&artifact()).expect("encode"), |json| {
            if let Some(weights) = json["layers"][1]["weights"].as_array_mut() {
                weights.pop();
            }
        });
        let error = decode(&bytes).expect_err("shape mismatch");
        assert!(matches!(error, ArtifactError::ShapeMismatch(_)));
    }

    #[test]
    fn missing_fields_are_a_shape_mismatch() {
        let bytes = mutate(&encode(&artifact()).expect("encode"), |json| {
            if let Some(map) = json.as_object_mut() {
                map.remove("head");
            }
        });
        assert!(matches!(decode(&bytes), Err(ArtifactError::ShapeMismatch(_))));
    }

    #[test]
    fn garbage_is_corrupt_and_not_retryable() {
        let error = decode(b"\x00\x01not json").expect_err("corrupt");
        assert!(matches!(error, ArtifactError::Corrupt(_)));
        assert!(!error.is_compatibility());

        let bytes = encode(&artifact()).expect("encode");
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(decode(truncated), Err(ArtifactError::Corrupt(_))));
    }
}
