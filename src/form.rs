//! Student input form: fields, range clamps and mapping to model features.

use crate::models::loader::AssetBundle;
use crate::types::feature::FeatureValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GRADE_200_RANGE: (f64, f64) = (0.0, 200.0);
pub const SEMESTER_GRADE_RANGE: (f64, f64) = (0.0, 20.0);
pub const AGE_RANGE: (f64, f64) = (17.0, 70.0);

/// Marital status codes offered by the form selector
pub const MARITAL_STATUS_OPTIONS: [(i64, &str); 6] = [
    (1, "Single"),
    (2, "Married"),
    (3, "Widower"),
    (4, "Facto union"),
    (5, "Legally separated"),
    (6, "Other"),
];

/// One form submission.
///
/// Selector fields hold the raw codes (`1`/`0`, marital status `1..=6`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentForm {
    pub admission_grade: f64,
    pub previous_qualification_grade: f64,
    pub sem1_enrolled: f64,
    pub sem1_approved: f64,
    pub sem1_grade: f64,
    pub sem2_enrolled: f64,
    pub sem2_approved: f64,
    pub sem2_grade: f64,
    pub age: f64,
    pub tuition_up_to_date: i64,
    pub scholarship_holder: i64,
    pub debtor: i64,
    pub gender: i64,
    pub marital_status: i64,
    pub displaced: i64,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            admission_grade: 120.0,
            previous_qualification_grade: 130.0,
            sem1_enrolled: 20.0,
            sem1_approved: 18.0,
            sem1_grade: 14.0,
            sem2_enrolled: 20.0,
            sem2_approved: 18.0,
            sem2_grade: 14.0,
            age: 20.0,
            // Selectors start on their first option
            tuition_up_to_date: 1,
            scholarship_holder: 1,
            debtor: 1,
            gender: 1,
            marital_status: 1,
            displaced: 1,
        }
    }
}

impl StudentForm {
    /// Initial form values, with the two entry grades taken from the
    /// bundle's training medians when available.
    pub fn initial(bundle: &AssetBundle) -> Self {
        let defaults = Self::default();
        Self {
            admission_grade: bundle
                .default_number("Admission_grade")
                .unwrap_or(defaults.admission_grade),
            previous_qualification_grade: bundle
                .default_number("Previous_qualification_grade")
                .unwrap_or(defaults.previous_qualification_grade),
            ..defaults
        }
    }

    /// Clamp numeric inputs to the ranges the form allows.
    ///
    /// Selector codes are left as submitted.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64, (lo, hi): (f64, f64)| if v.is_nan() { lo } else { v.clamp(lo, hi) };
        // Unit counts have no upper widget bound, so anything non-finite resets to 0
        let units = |v: f64| if v.is_finite() { v.max(0.0).round() } else { 0.0 };

        Self {
            admission_grade: clamp(self.admission_grade, GRADE_200_RANGE),
            previous_qualification_grade: clamp(self.previous_qualification_grade, GRADE_200_RANGE),
            sem1_enrolled: units(self.sem1_enrolled),
            sem1_approved: units(self.sem1_approved),
            sem1_grade: clamp(self.sem1_grade, SEMESTER_GRADE_RANGE),
            sem2_enrolled: units(self.sem2_enrolled),
            sem2_approved: units(self.sem2_approved),
            sem2_grade: clamp(self.sem2_grade, SEMESTER_GRADE_RANGE),
            age: clamp(self.age, AGE_RANGE).round(),
            ..self.clone()
        }
    }

    /// Feature values keyed by the model's raw column names, after clamping.
    pub fn to_user_values(&self) -> HashMap<String, FeatureValue> {
        let form = self.clamped();
        let numeric = |name: &str, v: f64| (name.to_string(), FeatureValue::Numeric(v));
        let code = |name: &str, v: i64| (name.to_string(), FeatureValue::Numeric(v as f64));

        HashMap::from([
            numeric("Admission_grade", form.admission_grade),
            numeric("Previous_qualification_grade", form.previous_qualification_grade),
            numeric("Curricular_units_1st_sem_enrolled", form.sem1_enrolled),
            numeric("Curricular_units_1st_sem_approved", form.sem1_approved),
            numeric("Curricular_units_1st_sem_grade", form.sem1_grade),
            numeric("Curricular_units_2nd_sem_enrolled", form.sem2_enrolled),
            numeric("Curricular_units_2nd_sem_approved", form.sem2_approved),
            numeric("Curricular_units_2nd_sem_grade", form.sem2_grade),
            numeric("Age_at_enrollment", form.age),
            code("Tuition_fees_up_to_date", form.tuition_up_to_date),
            code("Scholarship_holder", form.scholarship_holder),
            code("Debtor", form.debtor),
            code("Gender", form.gender),
            code("Displaced", form.displaced),
            code("Marital_status", form.marital_status),
        ])
    }
}

/// One row of the feature guide table
#[derive(Debug, Clone, Serialize)]
pub struct GuideRow {
    pub feature: &'static str,
    pub description: &'static str,
    pub range: &'static str,
}

/// Static data dictionary shown next to the form
pub static FEATURE_GUIDE: [GuideRow; 6] = [
    GuideRow {
        feature: "Admission Grade",
        description: "University entrance exam grade.",
        range: "0 - 200 (e.g. 140.5)",
    },
    GuideRow {
        feature: "Previous Qualification Grade",
        description: "Final grade of the previous qualification (secondary school or diploma).",
        range: "0 - 200 (e.g. 130.0)",
    },
    GuideRow {
        feature: "Curricular Units",
        description: "Number of curricular units enrolled in or approved.",
        range: "0 - 20 (integer)",
    },
    GuideRow {
        feature: "Semester Grade",
        description: "Average grade for the semester.",
        range: "0 - 20 (e.g. 14.5)",
    },
    GuideRow {
        feature: "Tuition Fees",
        description: "Whether tuition payments are up to date.",
        range: "Up to date / In arrears",
    },
    GuideRow {
        feature: "Displaced",
        description: "Whether the student lives away from their home region.",
        range: "Yes / No",
    },
];
