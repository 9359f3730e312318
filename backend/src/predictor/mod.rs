pub mod class_names;
pub mod command;
pub mod resize;

use async_trait::async_trait;
use shared::Artifact;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use class_names::ClassNames;
pub use command::CommandPredictor;

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("model file not found: {0}")]
    ModelMissing(PathBuf),
    #[error("class names: {0}")]
    ClassNames(String),
    #[error("predictor command is empty")]
    EmptyCommand,
    #[error("image preprocessing failed: {0}")]
    Preprocessing(String),
    #[error("predictor exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("predictor timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed predictor output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("predictor returned {actual} probabilities for {expected} classes")]
    ClassCountMismatch { expected: usize, actual: usize },
    #[error("predictor I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probabilities in class-name order plus the local explanation images.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub probabilities: Vec<f64>,
    pub heatmap: PathBuf,
    pub superimposed: PathBuf,
    pub masked: PathBuf,
}

impl Prediction {
    pub fn artifact_path(&self, artifact: Artifact) -> &Path {
        match artifact {
            Artifact::Heatmap => &self.heatmap,
            Artifact::Superimposed => &self.superimposed,
            Artifact::Masked => &self.masked,
        }
    }
}

#[async_trait]
pub trait Predictor: Send + Sync {
    /// The ordering the probability vector of [`Predictor::predict`] follows.
    fn class_names(&self) -> &ClassNames;

    async fn constrain_image_size(&self, path: &Path) -> Result<PathBuf, PredictorError>;

    async fn predict(&self, path: &Path, output_dir: &Path) -> Result<Prediction, PredictorError>;
}
