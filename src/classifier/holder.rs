//! Model Holder - owns the classifier for the lifetime of the process
//!
//! Built once during startup and never replaced. Cloning is cheap: the
//! classifier and its metadata sit behind `Arc`s.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::artifact::{ArtifactError, LoadOptions, ModelArtifact};
use super::Classifier;

/// Column description exposed by `GET /model`
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    pub name: String,
    pub kind: &'static str,
}

/// Describes what was loaded
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub format_version: u32,
    pub estimator: &'static str,
    pub labels: Vec<String>,
    pub features: Vec<FeatureInfo>,
    pub sha256: String,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl ModelMetadata {
    fn describe(artifact: &ModelArtifact, source: &Path, bytes: &[u8]) -> Self {
        Self {
            name: artifact.name.clone(),
            format_version: artifact.format_version,
            estimator: artifact.estimator.kind(),
            labels: artifact.classes.clone(),
            features: artifact
                .features
                .iter()
                .map(|f| FeatureInfo { name: f.name().to_string(), kind: f.kind() })
                .collect(),
            sha256: format!("{:x}", Sha256::digest(bytes)),
            source: source.display().to_string(),
            loaded_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct ModelHolder {
    classifier: Arc<dyn Classifier>,
    metadata: Arc<ModelMetadata>,
}

impl ModelHolder {
    /// Wrap an already constructed classifier
    pub fn new(classifier: Arc<dyn Classifier>, metadata: ModelMetadata) -> Self {
        Self { classifier, metadata: Arc::new(metadata) }
    }

    /// Load the artifact at `path`. Any failure here is fatal for startup.
    pub fn load(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        tracing::info!("Loading model artifact from: {}", path.display());

        let (artifact, bytes) = ModelArtifact::read(path)?;
        let metadata = ModelMetadata::describe(&artifact, path, &bytes);
        let classifier = artifact.compile(options)?;

        tracing::info!(
            model = %metadata.name,
            estimator = metadata.estimator,
            labels = metadata.labels.len(),
            features = metadata.features.len(),
            sha256 = %metadata.sha256,
            "Model artifact loaded"
        );

        Ok(Self::new(Arc::new(classifier), metadata))
    }

    pub fn classifier(&self) -> Arc<dyn Classifier> {
        Arc::clone(&self.classifier)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl fmt::Debug for ModelHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHolder")
            .field("model", &self.metadata.name)
            .field("sha256", &self.metadata.sha256)
            .finish()
    }
}
