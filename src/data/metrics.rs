// ---------------------------------------------------------------------------
// Regression metrics
// ---------------------------------------------------------------------------
//
// All three take `(y_true, y_pred)` of equal, non-zero length; the pipeline
// guarantees that before calling in.

/// MAE = (1/n) * Σ|y_true - y_pred|
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum();
    sum / y_true.len() as f64
}

/// MSE = (1/n) * Σ(y_true - y_pred)²
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    sum / y_true.len() as f64
}

/// R² = 1 - SS_res / SS_tot
///
/// A constant target has SS_tot = 0; the score is then 1.0 for a perfect
/// prediction and 0.0 for anything else.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Render a float the way Python's `repr(float)` does: whole numbers keep a
/// trailing `.0`, and magnitudes at or above 1e16 (or below 1e-4) switch to
/// exponent form with a signed, two-digit exponent (`1e+16`, `2.5e-05`).
pub fn display_float(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let magnitude = v.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{v:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => sci,
        };
    }
    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

// ---------------------------------------------------------------------------
// MetricsReport
// ---------------------------------------------------------------------------

/// The three fit metrics, already rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsReport {
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
}

impl MetricsReport {
    /// Score `y_pred` against `y_true`.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        MetricsReport {
            mae: round2(mean_absolute_error(y_true, y_pred)),
            mse: round2(mean_squared_error(y_true, y_pred)),
            r2: round2(r2_score(y_true, y_pred)),
        }
    }

    /// The first metric that came out infinite or NaN, if any.
    pub fn non_finite(&self) -> Option<(&'static str, f64)> {
        [("mae", self.mae), ("mse", self.mse), ("r2", self.r2)]
            .into_iter()
            .find(|(_, v)| !v.is_finite())
    }
}
