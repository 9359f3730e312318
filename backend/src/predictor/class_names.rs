use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::PredictorError;

#[derive(Debug, Clone)]
pub struct ClassNames {
    names: Arc<[String]>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Result<Self, PredictorError> {
        if names.is_empty() {
            return Err(PredictorError::ClassNames("no class names defined".to_string()));
        }
        Ok(Self {
            names: names.into(),
        })
    }

    /// Reads a JSON array of names, or one name per line.
    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PredictorError::ClassNames(format!("{}: {}", path.display(), e)))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, PredictorError> {
        if let Ok(names) = serde_json::from_str::<Vec<String>>(raw) {
            return Self::new(names);
        }

        let names = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn class_from_prediction(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Name at the arg-max; the first maximum wins on ties.
    pub fn most_likely_class(&self, probabilities: &[f64]) -> Result<&str, PredictorError> {
        self.check(probabilities)?;

        let mut best = 0;
        for (index, probability) in probabilities.iter().enumerate().skip(1) {
            if *probability > probabilities[best] {
                best = index;
            }
        }
        Ok(&self.names[best])
    }

    /// Maps every class name to its probability rounded to four decimals.
    pub fn label(&self, probabilities: &[f64]) -> Result<BTreeMap<String, f64>, PredictorError> {
        self.check(probabilities)?;

        Ok(self
            .names
            .iter()
            .zip(probabilities)
            .map(|(name, probability)| (name.clone(), round_probability(*probability)))
            .collect())
    }

    pub fn check(&self, probabilities: &[f64]) -> Result<(), PredictorError> {
        if probabilities.len() != self.names.len() {
            return Err(PredictorError::ClassCountMismatch {
                expected: self.names.len(),
                actual: probabilities.len(),
            });
        }
        Ok(())
    }
}

// rounds on the exact decimal expansion of `value`
pub fn round_probability(value: f64) -> f64 {
    format!("{:.4}", value).parse().unwrap_or(value)
}
