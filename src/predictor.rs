use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{CellValue, FeatureTable};

// ---------------------------------------------------------------------------
// Predictor contract
// ---------------------------------------------------------------------------

/// A pre-fitted regression function. Loaded once at startup and shared
/// read-only between requests.
pub trait Predictor: Send + Sync {
    /// One prediction per row of `features`.
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, PredictionError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(
        "The feature names should match those that were passed during fit. \
         Expected {expected:?}, got {found:?}"
    )]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row}: value '{value}' in column '{column}' is not a finite number")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: found unknown category '{value}' in column '{column}'")]
    UnknownCategory {
        row: usize,
        column: String,
        value: String,
    },

    #[error("predictor returned {found} predictions for {expected} rows")]
    RowCount { expected: usize, found: usize },

    #[error("{what} is not finite ({value})")]
    NonFinite { what: String, value: f64 },
}

// ---------------------------------------------------------------------------
// Linear model artifact
// ---------------------------------------------------------------------------

/// One input of the linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureTerm {
    /// `coefficient * value`
    Numeric { name: String, coefficient: f64 },
    /// One-hot encoded column: the matching level's weight is added.
    Categorical {
        name: String,
        levels: BTreeMap<String, f64>,
    },
}

impl FeatureTerm {
    pub fn name(&self) -> &str {
        match self {
            FeatureTerm::Numeric { name, .. } | FeatureTerm::Categorical { name, .. } => name,
        }
    }

    fn contribution(&self, row: usize, cell: &CellValue) -> Result<f64, PredictionError> {
        match self {
            FeatureTerm::Numeric { name, coefficient } => match cell.as_f64() {
                Some(v) if v.is_finite() => Ok(coefficient * v),
                _ => Err(PredictionError::NonNumeric {
                    row,
                    column: name.clone(),
                    value: cell.to_string(),
                }),
            },
            FeatureTerm::Categorical { name, levels } => {
                let unknown = || PredictionError::UnknownCategory {
                    row,
                    column: name.clone(),
                    value: cell.to_string(),
                };
                let label = cell.as_label().ok_or_else(unknown)?;
                levels.get(&label).copied().ok_or_else(unknown)
            }
        }
    }
}

/// A fitted linear regression, serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    pub intercept: f64,
    pub features: Vec<FeatureTerm>,
}

impl LinearPredictor {
    /// Load a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        let model: LinearPredictor = serde_json::from_str(&text)
            .with_context(|| format!("parsing model artifact {}", path.display()))?;
        log::info!(
            "Loaded linear model from {} ({} features)",
            path.display(),
            model.features.len()
        );
        Ok(model)
    }

    /// Feature names in fit order.
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
        let names_match = features.columns.len() == self.features.len()
            && features
                .columns
                .iter()
                .zip(&self.features)
                .all(|(c, f)| c == f.name());
        if !names_match {
            return Err(PredictionError::FeatureMismatch {
                expected: self.feature_names(),
                found: features.columns.clone(),
            });
        }

        features
            .rows
            .iter()
            .enumerate()
            .map(|(row_no, row)| {
                row.iter()
                    .zip(&self.features)
                    .try_fold(self.intercept, |acc, (cell, term)| {
                        Ok::<_, PredictionError>(acc + term.contribution(row_no, cell)?)
                    })
            })
            .collect()
    }
}
