//! HTML rendering for the form, the result panel and the feature guide.
//!
//! Markup lives in `templates/` and is compiled into the binary. Template
//! names end in `.html`, so minijinja escapes every interpolated value.

use crate::form::{StudentForm, FEATURE_GUIDE, MARITAL_STATUS_OPTIONS};
use crate::types::prediction::{Outcome, PredictionResult};
use minijinja::{context, Environment, Error};
use serde::Serialize;
use std::collections::BTreeMap;

/// Class indices shown as probability bars
const PROBABILITY_BARS: [usize; 2] = [0, 2];

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("guide.html", include_str!("../../templates/guide.html")),
    ("unavailable.html", include_str!("../../templates/unavailable.html")),
];

#[derive(Serialize)]
struct Bar {
    label: String,
    percent: String,
}

#[derive(Serialize)]
struct ResultView {
    class: &'static str,
    headline: &'static str,
    advice: &'static str,
    bars: Vec<Bar>,
}

impl ResultView {
    fn new(result: &PredictionResult) -> Self {
        let class = match result.outcome {
            Outcome::Dropout => "dropout",
            Outcome::Enrolled => "enrolled",
            Outcome::Graduate => "graduate",
        };

        let bars = PROBABILITY_BARS
            .iter()
            .filter_map(|&index| {
                let p = result.probability(index)?;
                let label = result.class_labels.get(index)?;
                Some(Bar {
                    label: label.clone(),
                    percent: format!("{:.2}", p * 100.0),
                })
            })
            .collect();

        Self {
            class,
            headline: result.outcome.headline(),
            advice: result.outcome.advice(),
            bars,
        }
    }
}

/// Numeric inputs formatted the way the form shows them (`120`, not `120.0`)
fn number_values(form: &StudentForm) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("admission_grade", form.admission_grade.to_string()),
        (
            "previous_qualification_grade",
            form.previous_qualification_grade.to_string(),
        ),
        ("sem1_enrolled", form.sem1_enrolled.to_string()),
        ("sem1_approved", form.sem1_approved.to_string()),
        ("sem1_grade", form.sem1_grade.to_string()),
        ("sem2_enrolled", form.sem2_enrolled.to_string()),
        ("sem2_approved", form.sem2_approved.to_string()),
        ("sem2_grade", form.sem2_grade.to_string()),
        ("age", form.age.to_string()),
    ])
}

/// Compiled page templates
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// The prediction page: form, optionally followed by a result or an error
    pub fn form_page(
        &self,
        form: &StudentForm,
        outcome: Option<Result<&PredictionResult, &str>>,
    ) -> Result<String, Error> {
        let (result, error) = match outcome {
            Some(Ok(result)) => (Some(ResultView::new(result)), None),
            Some(Err(message)) => (None, Some(message)),
            None => (None, None),
        };

        self.env.get_template("index.html")?.render(context! {
            form => form,
            values => number_values(form),
            marital_options => MARITAL_STATUS_OPTIONS,
            result => result,
            error => error,
        })
    }

    /// The static feature guide table
    pub fn guide_page(&self) -> Result<String, Error> {
        self.env
            .get_template("guide.html")?
            .render(context! { rows => &FEATURE_GUIDE[..] })
    }

    /// Page shown when the application cannot serve predictions at all
    pub fn unavailable_page(&self, reason: &str) -> Result<String, Error> {
        self.env
            .get_template("unavailable.html")?
            .render(context! { reason => reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["Dropout".into(), "Enrolled".into(), "Graduate".into()]
    }

    fn templates() -> Templates {
        Templates::new().unwrap()
    }

    #[test]
    fn test_result_shows_dropout_and_graduate_bars() {
        let result = PredictionResult::new(0, vec![0.6512, 0.2, 0.1488], &labels());
        let html = templates()
            .form_page(&StudentForm::default(), Some(Ok(&result)))
            .unwrap();

        assert!(html.contains("Prediction: DROPOUT"));
        assert!(html.contains(r#"class="result dropout""#));
        assert!(html.contains("Dropout: 65.12%"));
        assert!(html.contains("Graduate: 14.88%"));
        assert!(!html.contains("Enrolled: 20.00%"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let html = templates()
            .form_page(&StudentForm::default(), Some(Err("column <Age> missing")))
            .unwrap();
        assert!(html.contains("column &lt;Age&gt; missing"));
        assert!(!html.contains("<Age>"));
    }

    #[test]
    fn test_form_preselects_values() {
        let form = StudentForm {
            marital_status: 3,
            admission_grade: 140.5,
            ..StudentForm::default()
        };
        let html = templates().form_page(&form, None).unwrap();

        assert!(html.contains(r#"<option value="3" selected>Widower</option>"#));
        assert!(html.contains(r#"<option value="1">Single</option>"#));
        assert!(html.contains(r#"name="admission_grade" value="140.5""#));
        assert!(html.contains(r#"name="sem1_enrolled" value="20""#));
        assert!(!html.contains("Probabilities"));
    }

    #[test]
    fn test_unbounded_inputs_have_no_max() {
        let html = templates().form_page(&StudentForm::default(), None).unwrap();
        assert!(html.contains(r#"name="sem1_enrolled" value="20" min="0" step="1" required"#));
        assert!(html.contains(r#"name="sem1_grade" value="14" min="0" max="20" step="any""#));
    }

    #[test]
    fn test_guide_lists_all_rows() {
        let html = templates().guide_page().unwrap();
        assert!(html.contains("Data Dictionary &amp; Value Ranges"));
        for row in &FEATURE_GUIDE {
            assert!(html.contains(row.feature));
        }
    }

    #[test]
    fn test_unavailable_page_escapes_reason() {
        let html = templates()
            .unavailable_page("bundle <model.json> not found")
            .unwrap();
        assert!(html.contains("Prediction is unavailable."));
        assert!(html.contains("bundle &lt;model.json&gt; not found"));
    }
}
