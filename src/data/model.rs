use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Bools coerce to 0.0 / 1.0; text and
    /// nulls are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(*b as u8 as f64),
            _ => None,
        }
    }

    /// The cell rendered as a category label (used for one-hot style features).
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the parsed CSV
// ---------------------------------------------------------------------------

/// The full parsed table. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Row-major cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FeatureTable / FeatureTargetSplit
// ---------------------------------------------------------------------------

/// The feature columns handed to the predictor: every column except the target.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// A dataset separated into features and ground-truth target values.
/// `target.len() == features.rows.len()` always holds.
#[derive(Debug, Clone)]
pub struct FeatureTargetSplit {
    pub features: FeatureTable,
    pub target: Vec<f64>,
}
