use shared::{AnalysisResponse, Artifact, ImageAnalysisRequest};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;

use crate::error::ApiError;
use crate::predictor::Predictor;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AnalysisService {
    storage: Arc<dyn BlobStore>,
    predictor: Arc<dyn Predictor>,
}

pub fn source_blob_path(request: &ImageAnalysisRequest) -> String {
    format!(
        "{}/{}/{}",
        request.user_id, request.prediction_id, request.original_filename
    )
}

pub fn artifact_blob_path(request: &ImageAnalysisRequest, artifact: Artifact, extension: &str) -> String {
    format!(
        "{}/{}/{}{}",
        request.user_id, request.prediction_id, artifact, extension
    )
}

/// Extension of `filename` including the leading dot, or empty.
pub fn blob_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

fn local_file_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
}

impl AnalysisService {
    pub fn new(storage: Arc<dyn BlobStore>, predictor: Arc<dyn Predictor>) -> Self {
        Self { storage, predictor }
    }

    /// Downloads the referenced image, runs the predictor and uploads the three
    /// artifacts. Uploads that already succeeded are kept if a later step fails.
    pub async fn analyze(&self, request: &ImageAnalysisRequest) -> Result<AnalysisResponse, ApiError> {
        let workspace = tempfile::Builder::new().prefix("analysis-").tempdir()?;
        let local_path = workspace.path().join(local_file_name(&request.original_filename));

        let source_path = source_blob_path(request);
        let data = self.storage.download(&source_path).await?;
        tokio::fs::write(&local_path, &data).await?;

        let file_size = tokio::fs::metadata(&local_path).await?.len();
        log::info!("Uploaded file size: {}", file_size);

        log::info!("Constraining uploaded image size...");
        let resized_path = self.predictor.constrain_image_size(&local_path).await?;

        log::info!("Running prediction...");
        let prediction = self.predictor.predict(&resized_path, workspace.path()).await?;

        let class_names = self.predictor.class_names();
        let predicted_class = class_names.most_likely_class(&prediction.probabilities)?.to_string();
        let class_probabilities = class_names.label(&prediction.probabilities)?;

        log::info!("Uploading results to blob storage...");
        let extension = blob_extension(&request.original_filename);
        let mut urls = HashMap::new();
        for artifact in Artifact::iter() {
            let blob_path = artifact_blob_path(request, artifact, &extension);
            let data = tokio::fs::read(prediction.artifact_path(artifact)).await?;
            let url = self.storage.upload(&blob_path, data).await?;
            urls.insert(artifact, url);
        }

        let mut url_for = |artifact: Artifact| urls.remove(&artifact).unwrap_or_default();
        Ok(AnalysisResponse {
            predicted_class,
            class_probabilities,
            heatmap: url_for(Artifact::Heatmap),
            superimposed: url_for(Artifact::Superimposed),
            masked: url_for(Artifact::Masked),
        })
    }
}
