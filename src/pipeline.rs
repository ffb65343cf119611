use std::sync::Arc;

use crate::config::TARGET_COLUMN;
use crate::data::loader::{load_csv, split_target};
use crate::data::metrics::MetricsReport;
use crate::error::{PipelineError, ValidationFailure};
use crate::predictor::{PredictionError, Predictor};
use crate::storage::UploadStore;

// ---------------------------------------------------------------------------
// UploadPipeline
// ---------------------------------------------------------------------------

/// Upload → store → load → predict → score.
///
/// Holds no per-request state; the only shared mutable resource is the upload
/// directory, where concurrent writes to one key are last-write-wins.
#[derive(Clone)]
pub struct UploadPipeline {
    store: UploadStore,
    predictor: Arc<dyn Predictor>,
}

impl UploadPipeline {
    pub fn new(store: UploadStore, predictor: Arc<dyn Predictor>) -> Self {
        Self { store, predictor }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Validate an uploaded file and write it to the upload directory.
    ///
    /// `filename` is `None` when the request carried no file part. Returns
    /// the sanitized key the report is generated from.
    pub fn accept_upload(&self, filename: Option<&str>, bytes: &[u8]) -> Result<String, PipelineError> {
        let filename = filename.ok_or(ValidationFailure::MissingFile)?;
        let key = UploadStore::key_for(filename)?;
        let path = self.store.save(&key, bytes)?;
        log::info!("Stored upload '{filename}' as {} ({} bytes)", path.display(), bytes.len());
        Ok(key)
    }

    /// Score the stored file `key` against its `Weight` column.
    pub fn generate_report(&self, key: &str) -> Result<MetricsReport, PipelineError> {
        let path = self.store.resolve(key)?;
        let dataset = load_csv(&path)?;
        let split = split_target(dataset, TARGET_COLUMN)?;

        let predictions = self.predictor.predict(&split.features)?;
        if predictions.len() != split.target.len() {
            return Err(PredictionError::RowCount {
                expected: split.target.len(),
                found: predictions.len(),
            }
            .into());
        }
        if let Some((row, &value)) = predictions.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PredictionError::NonFinite {
                what: format!("prediction for row {row}"),
                value,
            }
            .into());
        }

        let report = MetricsReport::compute(&split.target, &predictions);
        if let Some((metric, value)) = report.non_finite() {
            return Err(PredictionError::NonFinite {
                what: metric.to_string(),
                value,
            }
            .into());
        }
        log::info!(
            "Report for {key}: {} rows, mae={} mse={} r2={}",
            split.target.len(),
            report.mae,
            report.mse,
            report.r2
        );
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::FeatureTable;
    use crate::predictor::{FeatureTerm, LinearPredictor};

    /// Predicts the first feature column verbatim.
    pub(crate) struct EchoPredictor;

    impl Predictor for EchoPredictor {
        fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
            features
                .rows
                .iter()
                .enumerate()
                .map(|(row, cells)| {
                    cells.first().and_then(|c| c.as_f64()).ok_or_else(|| {
                        PredictionError::NonNumeric {
                            row,
                            column: features.columns.first().cloned().unwrap_or_default(),
                            value: cells.first().map(|c| c.to_string()).unwrap_or_default(),
                        }
                    })
                })
                .collect()
        }
    }

    /// Always returns a single prediction, whatever the input.
    struct ShortPredictor;

    impl Predictor for ShortPredictor {
        fn predict(&self, _features: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
            Ok(vec![1.0])
        }
    }

    fn pipeline(dir: &std::path::Path, predictor: Arc<dyn Predictor>) -> UploadPipeline {
        UploadPipeline::new(UploadStore::new(dir.join("uploads")), predictor)
    }

    #[test]
    fn disallowed_suffix_never_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(EchoPredictor));

        for name in ["data.txt", "data", "data.csv.bak", ""] {
            let err = p.accept_upload(Some(name), b"Length,Weight\n1,1\n").unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)), "{name}: {err:?}");
        }
        let err = p.accept_upload(None, b"").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationFailure::MissingFile)
        ));

        assert!(!p.store().dir().exists());
    }

    #[test]
    fn upload_then_report_with_exact_predictions() {
        let tmp = tempfile::tempdir().unwrap();
        let model = LinearPredictor {
            intercept: 0.0,
            features: vec![FeatureTerm::Numeric {
                name: "Length".into(),
                coefficient: 10.0,
            }],
        };
        let p = pipeline(tmp.path(), Arc::new(model));

        let key = p
            .accept_upload(Some("data.csv"), b"Length,Weight\n10,100\n20,200\n30,300\n")
            .unwrap();
        assert_eq!(key, "data.csv");

        let report = p.generate_report(&key).unwrap();
        assert_eq!(report, MetricsReport { mae: 0.0, mse: 0.0, r2: 1.0 });
    }

    #[test]
    fn report_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(EchoPredictor));
        let key = p
            .accept_upload(Some("fish.csv"), b"Length,Weight\n10,12\n20,18\n30,33\n")
            .unwrap();

        let first = p.generate_report(&key).unwrap();
        let second = p.generate_report(&key).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.mae, 2.33);
    }

    #[test]
    fn missing_weight_column() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(EchoPredictor));
        let key = p.accept_upload(Some("x.csv"), b"Length,Height\n1,2\n").unwrap();
        assert!(matches!(
            p.generate_report(&key),
            Err(PipelineError::MissingColumn(_))
        ));
    }

    #[test]
    fn unknown_key_is_a_storage_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(EchoPredictor));
        assert!(matches!(
            p.generate_report("never-uploaded.csv"),
            Err(PipelineError::Storage { .. })
        ));
    }

    /// Returns the same value for every row.
    struct ConstPredictor(f64);

    impl Predictor for ConstPredictor {
        fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
            Ok(vec![self.0; features.rows.len()])
        }
    }

    #[test]
    fn infinite_feature_is_a_prediction_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let model = LinearPredictor {
            intercept: 0.0,
            features: vec![FeatureTerm::Numeric {
                name: "Length".into(),
                coefficient: 10.0,
            }],
        };
        let p = pipeline(tmp.path(), Arc::new(model));
        let key = p.accept_upload(Some("inf.csv"), b"Length,Weight
inf,100
20,200
").unwrap();
        let err = p.generate_report(&key).unwrap_err();
        assert!(
            matches!(err, PipelineError::Prediction(PredictionError::NonNumeric { row: 0, .. })),
            "{err:?}"
        );
    }

    #[test]
    fn non_finite_prediction_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(ConstPredictor(f64::NAN)));
        let key = p.accept_upload(Some("x.csv"), b"Length,Weight
1,1
2,2
").unwrap();
        assert!(matches!(
            p.generate_report(&key),
            Err(PipelineError::Prediction(PredictionError::NonFinite { .. }))
        ));
    }

    #[test]
    fn overflowing_metric_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(ConstPredictor(-1e200)));
        let key = p.accept_upload(Some("x.csv"), b"Length,Weight
1,1e200
2,1
").unwrap();
        let err = p.generate_report(&key).unwrap_err();
        assert!(
            matches!(err, PipelineError::Prediction(PredictionError::NonFinite { ref what, .. }) if what == "mse"),
            "{err:?}"
        );
    }

    #[test]
    fn short_prediction_vector_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = pipeline(tmp.path(), Arc::new(ShortPredictor));
        let key = p.accept_upload(Some("x.csv"), b"Length,Weight\n1,1\n2,2\n").unwrap();
        let err = p.generate_report(&key).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Prediction(PredictionError::RowCount { expected: 2, found: 1 })
        ));
        assert_eq!(err.kind(), "prediction");
    }
}
