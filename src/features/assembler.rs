//! Merges user-supplied values over the default feature vector.

use crate::types::feature::{FeatureValue, RawFeatureRecord};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Builds complete raw feature records from partial user input.
pub struct FeatureAssembler {
    defaults: RawFeatureRecord,
}

impl FeatureAssembler {
    pub fn new(defaults: RawFeatureRecord) -> Self {
        Self { defaults }
    }

    /// Merge `user_values` over the defaults.
    ///
    /// The result holds every default key plus any extra user keys. A number
    /// given for a column whose default is categorical becomes a category
    /// label, so selector inputs encode like the training data. Extra keys
    /// are kept; alignment drops them later.
    pub fn assemble(&self, user_values: &HashMap<String, FeatureValue>) -> RawFeatureRecord {
        let mut record = self.defaults.clone();

        for (name, value) in user_values {
            let value = match self.defaults.get(name) {
                Some(default) if default.is_categorical() => value.clone().into_categorical(),
                Some(_) => value.clone(),
                None => {
                    warn!(feature = %name, "Input is not a known feature and will be ignored by the model");
                    value.clone()
                }
            };
            record.insert(name.clone(), value);
        }

        debug!(
            features = record.len(),
            overridden = user_values.len(),
            "Feature record assembled"
        );
        record
    }

    pub fn defaults(&self) -> &RawFeatureRecord {
        &self.defaults
    }
}
