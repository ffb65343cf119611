/// Data layer: core types, CSV loading, and scoring.
///
/// Architecture:
/// ```text
///   uploads/<name>.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │  split_target("Weight")
///        ▼
///   ┌───────────────────┐
///   │ FeatureTargetSplit │  FeatureTable + Vec<f64>
///   └───────────────────┘
///        │  Predictor::predict
///        ▼
///   ┌──────────┐
///   │ metrics   │  MAE / MSE / R² → MetricsReport
///   └──────────┘
/// ```

pub mod loader;
pub mod metrics;
pub mod model;
