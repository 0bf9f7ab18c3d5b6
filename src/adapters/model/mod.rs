//! Model adapter: Implementations of the `Classifier` port.
//!
//! Two models are provided:
//! - `LinearModel`: a pre-trained one-vs-rest linear model exported to
//!   `model.json` by the training pipeline
//! - `ExemplarModel`: a nearest-row model over the deduplicated training
//!   table, used when no model artifact is configured
//!
//! # Model integrity
//!
//! A model directory may carry `manifest.json` (SHA-256 of each bound file)
//! and `model.sig` (Ed25519 signature over the manifest bytes). When present
//! they are verified before the model is parsed. When absent the model is
//! loaded unsigned unless the policy requires signatures.
//!
//! To sign a model directory:
//! 1. Generate a keypair: `cargo run --bin generate_keypair -- --out-seed <path>`
//! 2. Sign: `cargo run --bin sign_model -- <model_dir>`
//! 3. Point `MEDIREC_MODEL_SIGNING_PUBKEY_B64_FILE` at the public key

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{ClassId, DiseaseLabelSpace, FeatureVector, TrainingTable};
use crate::ports::{Classifier, ModelError};
use crate::ConfigError;

/// File name of the model artifact inside a model directory.
pub const MODEL_FILE: &str = "model.json";
/// File name of the signed manifest.
pub const MANIFEST_FILE: &str = "manifest.json";
/// File name of the manifest signature.
pub const SIGNATURE_FILE: &str = "model.sig";

/// Linear model parameters exported by the training pipeline.
///
/// `coefficients[c][j]` weighs feature `j` for class `c`; the predicted
/// class is the arg-max of `coefficients[c] · x + intercepts[c]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct SignedModelManifest {
    pub(crate) version: u32,
    #[serde(default)]
    pub(crate) serial: Option<u64>,
    #[serde(default)]
    pub(crate) created_at: Option<i64>,
    pub(crate) files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// How model signatures are enforced.
#[derive(Debug, Clone, Default)]
pub struct SignaturePolicy {
    /// Refuse model directories without `manifest.json` and `model.sig`.
    pub require_signed: bool,
    /// Key that signed manifests must verify against.
    pub verifying_key: Option<VerifyingKey>,
}

impl SignaturePolicy {
    /// Build a policy, reading a base64 verifying key from `pubkey_file` if given.
    ///
    /// # Errors
    /// Returns `ConfigError::Signature` if the key file is unreadable or invalid.
    pub fn new(require_signed: bool, pubkey_file: Option<&Path>) -> Result<Self, ConfigError> {
        let verifying_key = match pubkey_file {
            Some(path) => {
                let b64 = fs::read_to_string(path).map_err(|e| {
                    ConfigError::Signature(format!("Failed reading pubkey file {path:?}: {e}"))
                })?;
                Some(verifying_key_from_b64(&b64)?)
            }
            None => None,
        };
        Ok(Self {
            require_signed,
            verifying_key,
        })
    }
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ConfigError::Signature` on bad base64 or key bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ConfigError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| ConfigError::Signature(format!("Invalid pubkey base64: {e}")))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::Signature("Pubkey must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| ConfigError::Signature("Invalid Ed25519 public key".into()))
}

/// Verify the manifest and signature of a model directory.
///
/// Returns `true` when the directory is signed and verified, `false` when it
/// is unsigned and the policy allows that.
///
/// # Errors
/// Returns `ConfigError::Signature` on any verification failure.
pub fn verify_model_dir(dir: &Path, policy: &SignaturePolicy) -> Result<bool, ConfigError> {
    let sig_path = dir.join(SIGNATURE_FILE);
    let manifest_path = dir.join(MANIFEST_FILE);

    if !sig_path.exists() || !manifest_path.exists() {
        if policy.require_signed {
            tracing::error!("Model signature not found at {:?}", sig_path);
            return Err(ConfigError::Signature(format!(
                "{SIGNATURE_FILE} and {MANIFEST_FILE} are required in {dir:?}"
            )));
        }
        tracing::warn!("Loading UNSIGNED model from {:?}", dir);
        return Ok(false);
    }

    let key = policy.verifying_key.as_ref().ok_or_else(|| {
        ConfigError::Signature("signed model present but no verifying key configured".into())
    })?;

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| ConfigError::Signature(format!("Failed to read signature: {e}")))?;
    let sig_bytes: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::Signature("Invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let manifest_content = fs::read(&manifest_path)
        .map_err(|e| ConfigError::Signature(format!("Failed to read manifest: {e}")))?;
    key.verify(&manifest_content, &signature)
        .map_err(|_| ConfigError::Signature("Invalid model signature".into()))?;

    let manifest: SignedModelManifest = serde_json::from_slice(&manifest_content)
        .map_err(|e| ConfigError::Signature(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
    if manifest.version != 1 {
        return Err(ConfigError::Signature(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    if !manifest.files.contains_key(MODEL_FILE) {
        return Err(ConfigError::Signature(format!(
            "{MANIFEST_FILE} must bind {MODEL_FILE}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let plain_name = Path::new(rel)
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !plain_name {
            return Err(ConfigError::Signature(format!(
                "Manifest entry escapes the model directory: {rel}"
            )));
        }
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ConfigError::Signature(format!(
                "Manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ConfigError::Signature(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!(
        "Model signature verified (serial={:?}, created_at={:?})",
        manifest.serial,
        manifest.created_at
    );
    Ok(true)
}

/// Pre-trained one-vs-rest linear classifier.
#[derive(Debug, Clone)]
pub struct LinearModel {
    artifact: LinearModelArtifact,
}

impl LinearModel {
    /// Validate an artifact and wrap it.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidModel` on inconsistent shapes or
    /// non-finite parameters.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, ConfigError> {
        let n_features = artifact.feature_names.len();
        let n_classes = artifact.coefficients.len();

        if n_features == 0 || n_classes == 0 {
            return Err(ConfigError::InvalidModel(
                "model must have at least one feature and one class".into(),
            ));
        }
        if artifact.intercepts.len() != n_classes {
            return Err(ConfigError::InvalidModel(format!(
                "{} intercepts for {} classes",
                artifact.intercepts.len(),
                n_classes
            )));
        }
        if let Some((class, row)) = artifact
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_features)
        {
            return Err(ConfigError::InvalidModel(format!(
                "class {class} has {} coefficients, expected {n_features}",
                row.len()
            )));
        }
        if let Some(classes) = &artifact.classes {
            if classes.len() != n_classes {
                return Err(ConfigError::InvalidModel(format!(
                    "{} class names for {} classes",
                    classes.len(),
                    n_classes
                )));
            }
        }
        let all_finite = artifact
            .coefficients
            .iter()
            .flatten()
            .chain(&artifact.intercepts)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ConfigError::InvalidModel(
                "model parameters must be finite".into(),
            ));
        }

        Ok(Self { artifact })
    }

    /// Load `model.json` from a model directory after integrity checks.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is missing, unsigned when required,
    /// fails verification, or is malformed.
    pub fn load(model_dir: &Path, policy: &SignaturePolicy) -> Result<Self, ConfigError> {
        let model_path = model_dir.join(MODEL_FILE);
        if !model_path.is_file() {
            return Err(ConfigError::MissingFile(model_path));
        }
        let signed = verify_model_dir(model_dir, policy)?;

        let content = fs::read_to_string(&model_path)
            .map_err(|e| ConfigError::InvalidModel(e.to_string()))?;
        let artifact: LinearModelArtifact = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidModel(e.to_string()))?;
        let model = Self::from_artifact(artifact)?;

        tracing::info!(
            "Loaded linear model from {:?} (n_features={}, n_classes={}, signed={})",
            model_path,
            model.n_features(),
            model.n_classes(),
            signed
        );
        Ok(model)
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        self.artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(w, b)| w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearModel {
    fn n_features(&self) -> usize {
        self.artifact.feature_names.len()
    }

    fn n_classes(&self) -> usize {
        self.artifact.coefficients.len()
    }

    fn class_names(&self) -> Option<&[String]> {
        self.artifact.classes.as_deref()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.artifact.feature_names)
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassId, ModelError> {
        if features.len() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        let scores = self.scores(&features.to_f64());
        // Strict comparison keeps the lowest class id on ties.
        let mut best: Option<(usize, f64)> = None;
        for (idx, score) in scores.into_iter().enumerate() {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| ClassId(idx)).ok_or(ModelError::NoClasses)
    }
}

/// Nearest-row classifier over the deduplicated training table.
///
/// Predicts the class of the training row with the smallest Hamming
/// distance; ties go to the lowest class id.
#[derive(Debug, Clone)]
pub struct ExemplarModel {
    exemplars: Vec<(FeatureVector, ClassId)>,
    n_features: usize,
    n_classes: usize,
}

impl ExemplarModel {
    /// Build from a training table and its label space.
    #[must_use]
    pub fn from_training(table: &TrainingTable, labels: &DiseaseLabelSpace) -> Self {
        let exemplars: Vec<(FeatureVector, ClassId)> = table
            .rows()
            .iter()
            .filter_map(|row| labels.id(&row.label).map(|id| (row.features.clone(), id)))
            .collect();
        tracing::info!(
            "Built exemplar model from {} training rows ({} classes)",
            exemplars.len(),
            labels.len()
        );
        Self {
            exemplars,
            n_features: table.symptoms().len(),
            n_classes: labels.len(),
        }
    }
}

impl Classifier for ExemplarModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassId, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        self.exemplars
            .iter()
            .filter_map(|(row, id)| row.hamming(features).map(|d| (d, *id)))
            .min()
            .map(|(_, id)| id)
            .ok_or(ModelError::NoClasses)
    }
}

/// The model selected at startup.
#[derive(Debug, Clone)]
pub enum LoadedModel {
    Linear(LinearModel),
    Exemplar(ExemplarModel),
}

impl Classifier for LoadedModel {
    fn n_features(&self) -> usize {
        match self {
            Self::Linear(m) => m.n_features(),
            Self::Exemplar(m) => m.n_features(),
        }
    }

    fn n_classes(&self) -> usize {
        match self {
            Self::Linear(m) => m.n_classes(),
            Self::Exemplar(m) => m.n_classes(),
        }
    }

    fn class_names(&self) -> Option<&[String]> {
        match self {
            Self::Linear(m) => m.class_names(),
            Self::Exemplar(m) => m.class_names(),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Linear(m) => m.feature_names(),
            Self::Exemplar(m) => m.feature_names(),
        }
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassId, ModelError> {
        match self {
            Self::Linear(m) => m.predict(features),
            Self::Exemplar(m) => m.predict(features),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::TrainingRow;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;

    /// Linear weights that reproduce each class's canonical symptom set:
    /// +1 for the class's symptoms, -1 otherwise, intercept -|set|/2.
    pub(crate) fn artifact_for(
        feature_names: &[&str],
        classes: &[(&str, &[&str])],
    ) -> LinearModelArtifact {
        let coefficients = classes
            .iter()
            .map(|(_, set)| {
                feature_names
                    .iter()
                    .map(|f| if set.contains(f) { 1.0 } else { -1.0 })
                    .collect()
            })
            .collect();
        let intercepts = classes
            .iter()
            .map(|(_, set)| -(set.len() as f64) / 2.0)
            .collect();
        LinearModelArtifact {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            classes: Some(classes.iter().map(|(c, _)| c.to_string()).collect()),
            coefficients,
            intercepts,
        }
    }

    fn sample_artifact() -> LinearModelArtifact {
        artifact_for(
            &["itching", "skin_rash", "chills", "cough"],
            &[
                ("Allergy", &["chills"]),
                ("Common Cold", &["chills", "cough"]),
                ("Fungal infection", &["itching", "skin_rash"]),
            ],
        )
    }

    fn write_model(dir: &Path, artifact: &LinearModelArtifact) -> Vec<u8> {
        let bytes = serde_json::to_vec(artifact).expect("serialize model");
        fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn write_signed_manifest(dir: &Path, signing_key: &SigningKey, files: &[(&str, Vec<u8>)]) {
        let manifest = SignedModelManifest {
            version: 1,
            serial: Some(1),
            created_at: Some(0),
            files: files
                .iter()
                .map(|(rel, bytes)| ((*rel).to_string(), sha256_hex(bytes)))
                .collect(),
        };
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("write manifest");
        let signature: Signature = signing_key.sign(&manifest_bytes);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    fn signing_key() -> SigningKey {
        let mut sk = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut sk);
        SigningKey::from_bytes(&sk)
    }

    fn vector(bits: &[u8]) -> FeatureVector {
        FeatureVector::from_bits(bits.to_vec())
    }

    #[test]
    fn test_linear_predicts_canonical_sets() {
        let model = LinearModel::from_artifact(sample_artifact()).expect("Valid model");
        assert_eq!(model.predict(&vector(&[0, 0, 1, 0])).expect("predict"), ClassId(0));
        assert_eq!(model.predict(&vector(&[0, 0, 1, 1])).expect("predict"), ClassId(1));
        assert_eq!(model.predict(&vector(&[1, 1, 0, 0])).expect("predict"), ClassId(2));
    }

    #[test]
    fn test_linear_all_zero_vector_is_legal() {
        let model = LinearModel::from_artifact(sample_artifact()).expect("Valid model");
        assert!(model.predict(&vector(&[0, 0, 0, 0])).is_ok());
    }

    #[test]
    fn test_linear_ties_pick_lowest_class() {
        let artifact = LinearModelArtifact {
            feature_names: vec!["a".into()],
            classes: None,
            coefficients: vec![vec![1.0], vec![1.0]],
            intercepts: vec![0.0, 0.0],
        };
        let model = LinearModel::from_artifact(artifact).expect("Valid model");
        assert_eq!(model.predict(&vector(&[1])).expect("predict"), ClassId(0));
    }

    #[test]
    fn test_linear_dimension_mismatch() {
        let model = LinearModel::from_artifact(sample_artifact()).expect("Valid model");
        assert_eq!(
            model.predict(&vector(&[1, 0])),
            Err(ModelError::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_invalid_artifacts_rejected() {
        let mut bad = sample_artifact();
        bad.intercepts.pop();
        assert!(matches!(
            LinearModel::from_artifact(bad),
            Err(ConfigError::InvalidModel(_))
        ));

        let mut ragged = sample_artifact();
        ragged.coefficients[1].push(0.0);
        assert!(LinearModel::from_artifact(ragged).is_err());

        let mut nan = sample_artifact();
        nan.intercepts[0] = f64::NAN;
        assert!(LinearModel::from_artifact(nan).is_err());
    }

    #[test]
    fn test_exemplar_round_trips_training_rows() {
        let rows = vec![
            TrainingRow {
                features: vector(&[1, 1, 0]),
                label: "Fungal infection".into(),
            },
            TrainingRow {
                features: vector(&[0, 0, 1]),
                label: "Allergy".into(),
            },
            TrainingRow {
                features: vector(&[0, 1, 1]),
                label: "Common Cold".into(),
            },
        ];
        let table = TrainingTable::new(vec!["a".into(), "b".into(), "c".into()], rows)
            .expect("Valid table");
        let labels = table.label_space();
        let model = ExemplarModel::from_training(&table, &labels);

        for row in table.rows() {
            let id = model.predict(&row.features).expect("predict");
            assert_eq!(labels.name(id), Some(row.label.as_str()));
        }
        // Equidistant from Common Cold (id 1) and Fungal infection (id 2): lowest id wins.
        assert_eq!(model.predict(&vector(&[0, 1, 0])).expect("predict"), ClassId(1));
    }

    #[test]
    fn test_load_unsigned_model_allowed_by_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_model(temp.path(), &sample_artifact());
        let model = LinearModel::load(temp.path(), &SignaturePolicy::default())
            .expect("Unsigned model should load");
        assert_eq!(model.n_classes(), 3);
    }

    #[test]
    fn test_load_unsigned_model_refused_when_required() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_model(temp.path(), &sample_artifact());
        let policy = SignaturePolicy {
            require_signed: true,
            verifying_key: None,
        };
        assert!(matches!(
            LinearModel::load(temp.path(), &policy),
            Err(ConfigError::Signature(_))
        ));
    }

    #[test]
    fn test_load_signed_model() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &sample_artifact());
        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[(MODEL_FILE, bytes)]);

        let policy = SignaturePolicy {
            require_signed: true,
            verifying_key: Some(key.verifying_key()),
        };
        LinearModel::load(temp.path(), &policy).expect("Signed model should load");
    }

    #[test]
    fn test_tampered_model_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &sample_artifact());
        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[(MODEL_FILE, bytes)]);

        let mut tampered = sample_artifact();
        tampered.intercepts[0] = 100.0;
        write_model(temp.path(), &tampered);

        let policy = SignaturePolicy {
            require_signed: false,
            verifying_key: Some(key.verifying_key()),
        };
        assert!(matches!(
            LinearModel::load(temp.path(), &policy),
            Err(ConfigError::Signature(_))
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &sample_artifact());
        write_signed_manifest(temp.path(), &signing_key(), &[(MODEL_FILE, bytes)]);

        let policy = SignaturePolicy {
            require_signed: false,
            verifying_key: Some(signing_key().verifying_key()),
        };
        assert!(LinearModel::load(temp.path(), &policy).is_err());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let decoded = verifying_key_from_b64(&format!("{b64}\n")).expect("Valid key");
        assert_eq!(decoded, key.verifying_key());
        assert!(verifying_key_from_b64("not base64!").is_err());
    }
}
