//! In-memory doubles for the storage and predictor seams.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::predictor::{ClassNames, Prediction, Predictor, PredictorError};
use crate::storage::{BlobStore, StorageError};

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    downloads: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
    fail_upload: Option<String>,
}

impl MemoryBlobStore {
    pub fn with_blob(path: &str, data: &[u8]) -> Self {
        let store = Self::default();
        store.blobs.lock().unwrap().insert(path.to_string(), data.to_vec());
        store
    }

    pub fn failing_upload(mut self, path: &str) -> Self {
        self.fail_upload = Some(path.to_string());
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn blob(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.downloads.lock().unwrap().push(path.to_string());
        self.blob(path).ok_or_else(|| StorageError::Download {
            path: path.to_string(),
            message: "BlobNotFound".to_string(),
        })
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, StorageError> {
        if self.fail_upload.as_deref() == Some(path) {
            return Err(StorageError::Upload {
                path: path.to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(path.to_string());
        self.blobs.lock().unwrap().insert(path.to_string(), data);
        Ok(format!("https://blobs.test/padi/{}", path))
    }
}

/// Writes three fixed artifacts and reports fixed probabilities.
pub struct StubPredictor {
    class_names: ClassNames,
    probabilities: Vec<f64>,
    seen_inputs: Mutex<Vec<PathBuf>>,
}

impl StubPredictor {
    pub fn new(class_names: &[&str], probabilities: &[f64]) -> Self {
        Self {
            class_names: ClassNames::new(class_names.iter().map(|c| c.to_string()).collect()).unwrap(),
            probabilities: probabilities.to_vec(),
            seen_inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_inputs(&self) -> Vec<PathBuf> {
        self.seen_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Predictor for StubPredictor {
    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    async fn constrain_image_size(&self, path: &Path) -> Result<PathBuf, PredictorError> {
        Ok(path.to_path_buf())
    }

    async fn predict(&self, path: &Path, output_dir: &Path) -> Result<Prediction, PredictorError> {
        self.seen_inputs.lock().unwrap().push(path.to_path_buf());
        let artifact = |name: &str| -> Result<PathBuf, PredictorError> {
            let artifact_path = output_dir.join(format!("{}.out", name));
            std::fs::write(&artifact_path, name.as_bytes())?;
            Ok(artifact_path)
        };

        Ok(Prediction {
            probabilities: self.probabilities.clone(),
            heatmap: artifact("heatmap")?,
            superimposed: artifact("superimposed")?,
            masked: artifact("masked")?,
        })
    }
}
