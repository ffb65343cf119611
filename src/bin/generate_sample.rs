//! Writes `sample_fish.csv` and a matching `fish_market_model.json` so the
//! server can be tried end to end.

use anyhow::{Context, Result};
use serde_json::json;

/// Per-species shape: (name, length mean, length spread, height ratio, width ratio, weight offset).
const SPECIES: &[(&str, f64, f64, f64, f64, f64)] = &[
    ("Bream", 30.0, 4.0, 0.40, 0.15, 40.0),
    ("Roach", 22.0, 3.0, 0.26, 0.14, -20.0),
    ("Perch", 25.0, 8.0, 0.26, 0.16, 0.0),
    ("Pike", 45.0, 8.0, 0.16, 0.10, -120.0),
    ("Smelt", 12.0, 1.5, 0.17, 0.10, 60.0),
];

const INTERCEPT: f64 = -480.0;
const LENGTH1_COEF: f64 = 12.0;
const LENGTH2_COEF: f64 = 6.0;
const LENGTH3_COEF: f64 = 4.0;
const HEIGHT_COEF: f64 = 20.0;
const WIDTH_COEF: f64 = 35.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let csv_path = "sample_fish.csv";
    let model_path = "fish_market_model.json";

    let mut writer = csv::Writer::from_path(csv_path).context("creating sample CSV")?;
    writer.write_record(["Species", "Length1", "Length2", "Length3", "Height", "Width", "Weight"])?;

    let mut rows = 0;
    for &(species, mean_len, spread, height_ratio, width_ratio, offset) in SPECIES {
        for _ in 0..20 {
            let length1 = round1(rng.gauss(mean_len, spread).max(5.0));
            let length2 = round1(length1 * 1.08);
            let length3 = round1(length1 * 1.15);
            let height = round1(length3 * height_ratio);
            let width = round1(length3 * width_ratio);

            let fitted = INTERCEPT
                + offset
                + LENGTH1_COEF * length1
                + LENGTH2_COEF * length2
                + LENGTH3_COEF * length3
                + HEIGHT_COEF * height
                + WIDTH_COEF * width;
            let weight = round1((fitted + rng.gauss(0.0, 25.0)).max(1.0));

            writer.write_record([
                species.to_string(),
                length1.to_string(),
                length2.to_string(),
                length3.to_string(),
                height.to_string(),
                width.to_string(),
                weight.to_string(),
            ])?;
            rows += 1;
        }
    }
    writer.flush().context("writing sample CSV")?;

    let levels: serde_json::Map<String, serde_json::Value> = SPECIES
        .iter()
        .map(|&(name, .., offset)| (name.to_string(), json!(offset)))
        .collect();
    let model = json!({
        "intercept": INTERCEPT,
        "features": [
            { "kind": "categorical", "name": "Species", "levels": levels },
            { "kind": "numeric", "name": "Length1", "coefficient": LENGTH1_COEF },
            { "kind": "numeric", "name": "Length2", "coefficient": LENGTH2_COEF },
            { "kind": "numeric", "name": "Length3", "coefficient": LENGTH3_COEF },
            { "kind": "numeric", "name": "Height", "coefficient": HEIGHT_COEF },
            { "kind": "numeric", "name": "Width", "coefficient": WIDTH_COEF },
        ],
    });
    let text = serde_json::to_string_pretty(&model)?;
    std::fs::write(model_path, text).context("writing model artifact")?;

    println!("Wrote {rows} fish to {csv_path} and the model to {model_path}");
    Ok(())
}
