use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageAnalysisRequest {
    pub user_id: String,
    pub prediction_id: String,
    pub original_filename: String,
}

/// Explanation images produced for every analysed picture, in upload order.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Artifact {
    Heatmap,
    Superimposed,
    Masked,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisResponse {
    pub predicted_class: String,
    pub class_probabilities: BTreeMap<String, f64>,
    pub heatmap: String,
    pub superimposed: String,
    pub masked: String,
}

impl AnalysisResponse {
    pub fn artifact_url(&self, artifact: Artifact) -> &str {
        match artifact {
            Artifact::Heatmap => &self.heatmap,
            Artifact::Superimposed => &self.superimposed,
            Artifact::Masked => &self.masked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn artifacts_iterate_in_upload_order() {
        let names: Vec<String> = Artifact::iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["heatmap", "superimposed", "masked"]);
        assert_eq!(Artifact::Superimposed.as_ref(), "superimposed");
    }
}
