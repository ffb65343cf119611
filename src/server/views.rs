use minijinja::{context, Environment};

use crate::config::TARGET_COLUMN;
use crate::data::metrics::{display_float, MetricsReport};

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const RESULTS_HTML: &str = include_str!("../../templates/results.html");

// ---------------------------------------------------------------------------
// HTML views
// ---------------------------------------------------------------------------

/// Compiled page templates. Built once at startup.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_HTML)?;
        env.add_template("results.html", RESULTS_HTML)?;
        Ok(Self { env })
    }

    /// The upload form.
    pub fn index(&self) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { target => TARGET_COLUMN })
    }

    /// The three metrics for `filename`.
    pub fn results(&self, filename: &str, report: &MetricsReport) -> Result<String, minijinja::Error> {
        self.env.get_template("results.html")?.render(context! {
            filename => filename,
            mae => display_float(report.mae),
            mse => display_float(report.mse),
            r2 => display_float(report.r2),
        })
    }
}
