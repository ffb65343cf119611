use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{CellValue, Dataset, FeatureTable, FeatureTargetSplit};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Load a CSV file from disk.
///
/// CSV layout: header row with column names, one record per row.
/// Every record must have as many fields as the header.
pub fn load_csv(path: &Path) -> Result<Dataset, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::storage(path, e))?;
    read_csv(file)
}

/// Parse CSV from any reader. Cell types are inferred per cell.
pub fn read_csv<R: Read>(rdr: R) -> Result<Dataset, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .from_reader(rdr);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(PipelineError::Parse("No columns to parse from file".into()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(Dataset { columns, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Feature / target split
// ---------------------------------------------------------------------------

/// Separate `target` from the remaining columns.
///
/// Feature columns keep file order. Target cells must all be numeric, and the
/// dataset must have at least one row.
pub fn split_target(dataset: Dataset, target: &str) -> Result<FeatureTargetSplit, PipelineError> {
    let target_idx = dataset
        .column_index(target)
        .ok_or_else(|| PipelineError::MissingColumn(target.to_string()))?;

    if dataset.is_empty() {
        return Err(PipelineError::Parse(format!(
            "no data rows; found only the header ({} columns)",
            dataset.columns.len()
        )));
    }

    let columns: Vec<String> = dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, c)| c.clone())
        .collect();

    let mut target_values = Vec::with_capacity(dataset.len());
    let mut feature_rows = Vec::with_capacity(dataset.len());

    for (row_no, mut row) in dataset.rows.into_iter().enumerate() {
        let cell = row.remove(target_idx);
        let value = match cell.as_f64() {
            Some(v) if v.is_finite() => v,
            _ => {
                return Err(PipelineError::Parse(format!(
                    "row {row_no}: '{target}' value '{cell}' is not a finite number"
                )));
            }
        };
        target_values.push(value);
        feature_rows.push(row);
    }

    Ok(FeatureTargetSplit {
        features: FeatureTable {
            columns,
            rows: feature_rows,
        },
        target: target_values,
    })
}
