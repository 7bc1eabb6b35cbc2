//! Schema registry: the single source of truth for column names.
//!
//! Every other component asks the `Schema` which columns are numerical,
//! categorical, engineered, dropped, or the target. A `Schema` is built once at
//! process start and shared read-only; nothing mutates it afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

pub const LOCATION_NAME: &str = "Location_Name";
pub const AREA_SQFT: &str = "Area_SqFt";
pub const BEDROOMS: &str = "Bedrooms";
pub const BATHROOMS: &str = "Bathrooms";
pub const PROPERTY_TYPE: &str = "Property_Type";
pub const FURNISHING_STATUS: &str = "Furnishing_Status";
pub const YEAR_BUILT: &str = "Year_Built";
pub const GATED_COMMUNITY: &str = "Gated_Community";
pub const BALCONY: &str = "Balcony";
pub const FLOORS: &str = "Floors";
pub const FACING_DIRECTION: &str = "Facing_Direction";

pub const AGE_OF_PROPERTY: &str = "Age_of_Property_Years";
pub const PRICE_LAKHS: &str = "Price_Lakhs";

/// Reference year used to derive property age.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2025;

/// Raw input columns a prediction request must carry, in request order.
pub const RAW_INPUT_COLUMNS: [&str; 11] = [
    LOCATION_NAME,
    AREA_SQFT,
    BEDROOMS,
    BATHROOMS,
    PROPERTY_TYPE,
    FURNISHING_STATUS,
    YEAR_BUILT,
    GATED_COMMUNITY,
    BALCONY,
    FLOORS,
    FACING_DIRECTION,
];

/// Source-table columns that never reach the model.
const DROP_COLUMNS: [&str; 30] = [
    PRICE_LAKHS,
    "Property_ID",
    "Transaction_Date",
    "Transaction_Year",
    "Transaction_Month",
    "Market_Condition",
    "Location_Maturity",
    "Resale",
    "New_Construction",
    "Builder_Reputation",
    "Possession_Status",
    "Maintenance_Staff",
    "Gymnasium",
    "Swimming_Pool",
    "Landscaped_Gardens",
    "Jogging_Track",
    "Club_House",
    "24x7_Security",
    "Power_Backup",
    "Car_Parking",
    "Lift_Available",
    "School_Proximity_Km",
    "Hospital_Proximity_Km",
    "IT_Hub_Proximity_Km",
    "Metro_Proximity_Km",
    "Amenities_Score",
    "Transaction_Type",
    "Price_per_SqFt",
    "Period",
    YEAR_BUILT,
];

/// Derivation rule for the engineered age column:
/// `output = reference_year - source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRule {
    pub source: String,
    pub output: String,
    pub reference_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub raw_inputs: Vec<String>,
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
    pub age: AgeRule,
    pub target: String,
    pub drop: Vec<String>,
}

/// How a table's columns fare against the schema after feature engineering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAudit {
    /// Feature columns present, in schema order.
    pub kept: Vec<String>,
    /// Columns removed because the drop list names them.
    pub dropped_listed: Vec<String>,
    /// Columns the schema does not mention at all.
    pub dropped_unlisted: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::hyderabad(DEFAULT_REFERENCE_YEAR)
    }
}

impl Schema {
    /// The Hyderabad real-estate schema.
    pub fn hyderabad(reference_year: i32) -> Self {
        Self {
            raw_inputs: owned(&RAW_INPUT_COLUMNS),
            numerical: owned(&[AREA_SQFT, BEDROOMS, BATHROOMS, FLOORS, AGE_OF_PROPERTY]),
            categorical: owned(&[
                LOCATION_NAME,
                PROPERTY_TYPE,
                FURNISHING_STATUS,
                FACING_DIRECTION,
                GATED_COMMUNITY,
                BALCONY,
            ]),
            age: AgeRule {
                source: YEAR_BUILT.to_string(),
                output: AGE_OF_PROPERTY.to_string(),
                reference_year,
            },
            target: PRICE_LAKHS.to_string(),
            drop: owned(&DROP_COLUMNS),
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.age.reference_year
    }

    /// Feature columns in output order: numerical block, then categorical block.
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        self.numerical
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }

    /// Check that every feature column is produced by the raw inputs or the
    /// engineered rule and is not also on the drop list.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.numerical.is_empty() && self.categorical.is_empty() {
            return Err(SchemaError::Integrity("no feature columns configured".into()));
        }
        if !self.raw_inputs.contains(&self.age.source) {
            return Err(SchemaError::Integrity(format!(
                "engineered column `{}` derives from `{}`, which is not a raw input",
                self.age.output, self.age.source
            )));
        }

        let dropped: HashSet<&str> = self.drop.iter().map(String::as_str).collect();
        let mut available: HashSet<&str> = self.raw_inputs.iter().map(String::as_str).collect();
        available.insert(self.age.output.as_str());

        let mut seen = HashSet::new();
        for col in self.feature_columns() {
            if !seen.insert(col) {
                return Err(SchemaError::Integrity(format!("feature `{col}` is listed twice")));
            }
            if col == self.target {
                return Err(SchemaError::Integrity(format!("target `{col}` is also a feature")));
            }
            if dropped.contains(col) {
                return Err(SchemaError::Integrity(format!("feature `{col}` is on the drop list")));
            }
            if !available.contains(col) {
                return Err(SchemaError::Integrity(format!(
                    "feature `{col}` is neither a raw input nor an engineered column"
                )));
            }
        }
        Ok(())
    }

    /// Ensure every raw input column is present.
    pub fn check_raw_inputs<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Result<(), SchemaError> {
        let present: HashSet<&str> = columns.into_iter().collect();
        match self.raw_inputs.iter().find(|c| !present.contains(c.as_str())) {
            Some(col) => Err(SchemaError::MissingColumn { column: col.clone() }),
            None => Ok(()),
        }
    }

    /// Partition engineered-table columns into kept features and dropped columns.
    ///
    /// Fails if any feature column is absent: the surviving set must cover the
    /// numerical and categorical lists exactly, never be silently reindexed.
    pub fn audit_columns<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Result<ColumnAudit, SchemaError> {
        let present: Vec<&str> = columns.into_iter().collect();
        let features: HashSet<&str> = self.feature_columns().collect();
        let dropped: HashSet<&str> = self.drop.iter().map(String::as_str).collect();

        let mut audit = ColumnAudit::default();
        for col in self.feature_columns() {
            if !present.contains(&col) {
                return Err(SchemaError::MissingColumn { column: col.to_string() });
            }
            audit.kept.push(col.to_string());
        }
        for col in present {
            if features.contains(col) {
                continue;
            }
            if dropped.contains(col) {
                audit.dropped_listed.push(col.to_string());
            } else {
                audit.dropped_unlisted.push(col.to_string());
            }
        }
        Ok(audit)
    }

    /// Describe the first difference that would make a preprocessor fitted
    /// under `other` unusable under `self`.
    pub fn compatibility_issue(&self, numerical: &[String], categorical: &[String], reference_year: i32) -> Option<String> {
        if self.numerical != numerical {
            return Some(format!(
                "numerical features differ (artifact {numerical:?}, schema {:?})",
                self.numerical
            ));
        }
        if self.categorical != categorical {
            return Some(format!(
                "categorical features differ (artifact {categorical:?}, schema {:?})",
                self.categorical
            ));
        }
        if self.age.reference_year != reference_year {
            return Some(format!(
                "reference year differs (artifact {reference_year}, schema {})",
                self.age.reference_year
            ));
        }
        None
    }
}

fn owned(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}
