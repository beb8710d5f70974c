//! Smoke Prediction Tool
//!
//! Generates random form submissions and runs them through the prediction
//! pipeline against a bundle, then logs the label distribution.
//!
//! Usage: smoke_predict [bundle_path] [count] [at_risk_rate]

use anyhow::Context;
use rand::Rng;
use std::sync::Arc;
use student_outcome_predictor::{
    metrics::PredictionMetrics, AppConfig, AssetStore, Predictor, StudentForm,
};
use tracing::{info, warn};

/// Random student generator
struct StudentGenerator {
    rng: rand::rngs::ThreadRng,
}

impl StudentGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// A student keeping up with coursework
    fn generate_typical(&mut self) -> StudentForm {
        let sem1_enrolled = self.rng.gen_range(5..8) as f64;
        let sem2_enrolled = self.rng.gen_range(5..8) as f64;

        StudentForm {
            admission_grade: self.rng.gen_range(110.0..170.0),
            previous_qualification_grade: self.rng.gen_range(115.0..170.0),
            sem1_enrolled,
            sem1_approved: sem1_enrolled - self.rng.gen_range(0..2) as f64,
            sem1_grade: self.rng.gen_range(11.5..16.0),
            sem2_enrolled,
            sem2_approved: sem2_enrolled - self.rng.gen_range(0..2) as f64,
            sem2_grade: self.rng.gen_range(11.5..16.0),
            age: self.rng.gen_range(17..25) as f64,
            tuition_up_to_date: 1,
            scholarship_holder: self.rng.gen_bool(0.3) as i64,
            debtor: self.rng.gen_bool(0.05) as i64,
            gender: self.rng.gen_bool(0.4) as i64,
            marital_status: 1,
            displaced: self.rng.gen_bool(0.5) as i64,
        }
    }

    /// A student falling behind: few approved units, fees in arrears
    fn generate_at_risk(&mut self) -> StudentForm {
        let sem1_enrolled = self.rng.gen_range(4..8) as f64;
        let sem2_enrolled = self.rng.gen_range(4..8) as f64;

        StudentForm {
            admission_grade: self.rng.gen_range(95.0..130.0),
            previous_qualification_grade: self.rng.gen_range(95.0..135.0),
            sem1_enrolled,
            sem1_approved: self.rng.gen_range(0..3) as f64,
            sem1_grade: self.rng.gen_range(0.0..11.0),
            sem2_enrolled,
            sem2_approved: self.rng.gen_range(0..2) as f64,
            sem2_grade: self.rng.gen_range(0.0..10.0),
            age: self.rng.gen_range(19..45) as f64,
            tuition_up_to_date: self.rng.gen_bool(0.4) as i64,
            scholarship_holder: 0,
            debtor: self.rng.gen_bool(0.4) as i64,
            gender: self.rng.gen_bool(0.6) as i64,
            marital_status: self.rng.gen_range(1..=6),
            displaced: self.rng.gen_bool(0.4) as i64,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smoke_predict=info".parse()?)
                .add_directive("student_outcome_predictor=warn".parse()?),
        )
        .init();

    info!("Starting Smoke Prediction Tool");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let bundle_path: std::path::PathBuf = match args.get(1) {
        Some(path) => path.into(),
        None => AppConfig::load()
            .map(|c| c.assets.bundle_path)
            .unwrap_or_else(|_| AppConfig::default().assets.bundle_path),
    };
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.3);

    info!(
        bundle = %bundle_path.display(),
        count = count,
        at_risk_rate = at_risk_rate,
        "Configuration loaded"
    );

    let store = AssetStore::new(bundle_path);
    let bundle = store.load().context("Failed to load asset bundle")?;
    let metrics = Arc::new(PredictionMetrics::new());
    let predictor = Predictor::new(bundle).with_metrics(metrics.clone());

    let mut generator = StudentGenerator::new();
    let mut rng = rand::thread_rng();
    let mut at_risk_count = 0;

    for i in 0..count {
        let form = if rng.gen_bool(at_risk_rate.clamp(0.0, 1.0)) {
            at_risk_count += 1;
            generator.generate_at_risk()
        } else {
            generator.generate_typical()
        };

        match predictor.predict(&form.to_user_values()) {
            Ok(result) => {
                if i == 0 || (i + 1) % 25 == 0 {
                    info!(
                        submission = i + 1,
                        label = %result.label,
                        probabilities = ?result.probabilities,
                        "Sample prediction"
                    );
                }
            }
            Err(e) => warn!(submission = i + 1, error = %e, "Prediction failed"),
        }
    }

    info!(
        "Completed {} submissions ({} typical, {} at risk)",
        count,
        count - at_risk_count,
        at_risk_count
    );
    metrics.print_summary();

    Ok(())
}
