use actix_web::web;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::resize::{MAX_HEIGHT, constrain_to_height};
use super::{ClassNames, Prediction, Predictor, PredictorError};

/// Runs prediction in an external executable. The executable receives
/// `--model`, `--class-names`, `--input` and `--output-dir` and prints one
/// JSON line: `{"probabilities": [..], "heatmap": .., "superimposed": .., "masked": ..}`.
/// Artifact paths may be relative to the output directory.
pub struct CommandPredictor {
    program: String,
    args: Vec<String>,
    model_path: PathBuf,
    class_names_path: PathBuf,
    class_names: ClassNames,
    timeout: Duration,
}

#[derive(Deserialize)]
struct PredictorOutput {
    probabilities: Vec<f64>,
    heatmap: PathBuf,
    superimposed: PathBuf,
    masked: PathBuf,
}

impl CommandPredictor {
    pub fn load_model(
        command: &str,
        model_path: &Path,
        class_names_path: &Path,
        timeout: Duration,
    ) -> Result<Self, PredictorError> {
        if !model_path.exists() {
            return Err(PredictorError::ModelMissing(model_path.to_path_buf()));
        }
        let class_names = ClassNames::load(class_names_path)?;

        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(PredictorError::EmptyCommand)?;

        Ok(Self {
            program,
            args: parts.collect(),
            model_path: model_path.to_path_buf(),
            class_names_path: class_names_path.to_path_buf(),
            class_names,
            timeout,
        })
    }
}

#[async_trait]
impl Predictor for CommandPredictor {
    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    async fn constrain_image_size(&self, path: &Path) -> Result<PathBuf, PredictorError> {
        let path = path.to_path_buf();
        web::block(move || constrain_to_height(&path, MAX_HEIGHT))
            .await
            .map_err(|e| PredictorError::Preprocessing(e.to_string()))?
    }

    async fn predict(&self, path: &Path, output_dir: &Path) -> Result<Prediction, PredictorError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--class-names")
            .arg(&self.class_names_path)
            .arg("--input")
            .arg(path)
            .arg("--output-dir")
            .arg(output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| PredictorError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(PredictorError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // the predictor may log before printing its result line
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
        let parsed: PredictorOutput = serde_json::from_str(line)?;
        self.class_names.check(&parsed.probabilities)?;

        Ok(Prediction {
            probabilities: parsed.probabilities,
            heatmap: output_dir.join(parsed.heatmap),
            superimposed: output_dir.join(parsed.superimposed),
            masked: output_dir.join(parsed.masked),
        })
    }
}
