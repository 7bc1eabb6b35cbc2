//! Typed prediction record and boundary validation.
//!
//! Requests arrive as loosely typed key/value maps (JSON objects or CLI
//! `Name=Value` pairs). `PropertyRecord::from_fields` validates every field in
//! one pass and reports all problems together.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::*;
use super::table::{Cell, Table};

/// One property to price. Field names follow the raw input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(rename = "Location_Name")]
    pub location_name: String,
    #[serde(rename = "Area_SqFt")]
    pub area_sqft: f64,
    #[serde(rename = "Bedrooms")]
    pub bedrooms: i64,
    #[serde(rename = "Bathrooms")]
    pub bathrooms: i64,
    #[serde(rename = "Property_Type")]
    pub property_type: String,
    #[serde(rename = "Furnishing_Status")]
    pub furnishing_status: String,
    #[serde(rename = "Year_Built")]
    pub year_built: i64,
    #[serde(rename = "Gated_Community")]
    pub gated_community: String,
    #[serde(rename = "Balcony")]
    pub balcony: String,
    #[serde(rename = "Floors")]
    pub floors: i64,
    #[serde(rename = "Facing_Direction")]
    pub facing_direction: String,
}

/// Every missing or malformed field of a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{}", self.describe())]
pub struct ValidationError {
    pub missing: Vec<String>,
    /// `(field, problem)` pairs.
    pub malformed: Vec<(String, String)>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.malformed.is_empty()
    }

    fn describe(&self) -> String {
        let mut parts: Vec<String> = self.missing.iter().map(|f| format!("missing field: {f}")).collect();
        parts.extend(self.malformed.iter().map(|(f, why)| format!("malformed field: {f} ({why})")));
        parts.join("; ")
    }
}

impl PropertyRecord {
    /// Validate a JSON object. Unknown keys are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut v = FieldReader {
            fields,
            errors: ValidationError::default(),
        };

        let record = PropertyRecord {
            location_name: v.text(LOCATION_NAME),
            area_sqft: v.number(AREA_SQFT),
            bedrooms: v.integer(BEDROOMS),
            bathrooms: v.integer(BATHROOMS),
            property_type: v.text(PROPERTY_TYPE),
            furnishing_status: v.text(FURNISHING_STATUS),
            year_built: v.integer(YEAR_BUILT),
            gated_community: v.text(GATED_COMMUNITY),
            balcony: v.text(BALCONY),
            floors: v.integer(FLOORS),
            facing_direction: v.text(FACING_DIRECTION),
        };

        if v.errors.is_empty() {
            Ok(record)
        } else {
            Err(v.errors)
        }
    }

    /// Validate a parsed JSON document, which must be an object.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Self::from_fields(map),
            _ => Err(ValidationError {
                missing: Vec::new(),
                malformed: vec![("<body>".into(), "expected a JSON object".into())],
            }),
        }
    }

    /// Validate `Name=Value` pairs (values are interpreted as JSON strings).
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, ValidationError> {
        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), Value::String(v.trim().to_string())))
            .collect();
        Self::from_fields(&map)
    }

    /// Single-row table with the raw input columns.
    ///
    /// Categorical values are typed with `Cell::parse`, exactly as ingest types
    /// CSV fields, so `"1.0"` and `1` reach the encoder as the same label.
    pub fn to_table(&self) -> Table {
        let cells = vec![
            (LOCATION_NAME, Cell::parse(&self.location_name)),
            (AREA_SQFT, Cell::Number(self.area_sqft)),
            (BEDROOMS, Cell::Number(self.bedrooms as f64)),
            (BATHROOMS, Cell::Number(self.bathrooms as f64)),
            (PROPERTY_TYPE, Cell::parse(&self.property_type)),
            (FURNISHING_STATUS, Cell::parse(&self.furnishing_status)),
            (YEAR_BUILT, Cell::Number(self.year_built as f64)),
            (GATED_COMMUNITY, Cell::parse(&self.gated_community)),
            (BALCONY, Cell::parse(&self.balcony)),
            (FLOORS, Cell::Number(self.floors as f64)),
            (FACING_DIRECTION, Cell::parse(&self.facing_direction)),
        ];
        let (names, row): (Vec<String>, Vec<Cell>) = cells.into_iter().map(|(n, c)| (n.to_string(), c)).unzip();
        let mut table = Table::new(names);
        table.push_row(row);
        table
    }
}

struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
    errors: ValidationError,
}

impl<'a> FieldReader<'a> {
    fn get(&mut self, name: &str) -> Option<&'a Value> {
        match self.fields.get(name) {
            None | Some(Value::Null) => {
                self.errors.missing.push(name.to_string());
                None
            }
            Some(v) => Some(v),
        }
    }

    fn malformed(&mut self, name: &str, why: impl fmt::Display) {
        self.errors.malformed.push((name.to_string(), why.to_string()));
    }

    fn text(&mut self, name: &str) -> String {
        let parsed = match self.get(name) {
            None => return String::new(),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err("expected a string or number"),
        };
        match parsed {
            Ok(s) if s.is_empty() => {
                self.errors.missing.push(name.to_string());
                s
            }
            Ok(s) => s,
            Err(why) => {
                self.malformed(name, why);
                String::new()
            }
        }
    }

    fn number(&mut self, name: &str) -> f64 {
        let parsed = match self.get(name) {
            None => return f64::NAN,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(v) if v.is_finite() => v,
            _ => {
                self.malformed(name, "expected a finite number");
                f64::NAN
            }
        }
    }

    fn integer(&mut self, name: &str) -> i64 {
        let parsed = match self.get(name) {
            None => return 0,
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
            }
            Some(_) => None,
        };
        match parsed {
            Some(v) => v,
            None => {
                self.malformed(name, "expected a whole number");
                0
            }
        }
    }
}

/// `f` as an `i64` when it is integral and inside the `i64` range.
fn whole_number(f: f64) -> Option<i64> {
    // 2^63 is exact in f64; `as` would saturate anything at or beyond it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "Location_Name": "Gachibowli",
            "Area_SqFt": 1450.0,
            "Bedrooms": 3,
            "Bathrooms": 2,
            "Property_Type": "Apartment",
            "Furnishing_Status": "Semi-Furnished",
            "Year_Built": 2015,
            "Gated_Community": "Yes",
            "Balcony": "Yes",
            "Floors": 12,
            "Facing_Direction": "East"
        })
    }

    #[test]
    fn valid_record_parses_and_ignores_extras() {
        let mut body = sample_json();
        body["Unrelated"] = json!("ignored");
        let rec = PropertyRecord::from_json(&body).unwrap();
        assert_eq!(rec.location_name, "Gachibowli");
        assert_eq!(rec.bathrooms, 2);

        let table = rec.to_table();
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.column(YEAR_BUILT).unwrap(), &[Cell::Number(2015.0)]);
    }

    #[test]
    fn missing_bathrooms_is_named() {
        let mut body = sample_json();
        body.as_object_mut().unwrap().remove("Bathrooms");
        let err = PropertyRecord::from_json(&body).unwrap_err();
        assert_eq!(err.missing, vec!["Bathrooms".to_string()]);
        assert_eq!(err.to_string(), "missing field: Bathrooms");
    }

    #[test]
    fn all_problems_reported_in_one_pass() {
        let mut body = sample_json();
        let obj = body.as_object_mut().unwrap();
        obj.remove("Bathrooms");
        obj.remove("Location_Name");
        obj.insert("Area_SqFt".into(), json!("large"));
        obj.insert("Floors".into(), json!(2.5));

        let err = PropertyRecord::from_json(&body).unwrap_err();
        assert_eq!(err.missing, vec!["Location_Name".to_string(), "Bathrooms".to_string()]);
        let bad: Vec<&str> = err.malformed.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(bad, vec!["Area_SqFt", "Floors"]);
    }

    #[test]
    fn pairs_accept_numeric_strings() {
        let pairs = [
            ("Location_Name", "Kondapur"),
            ("Area_SqFt", "1200"),
            ("Bedrooms", "2"),
            ("Bathrooms", "2"),
            ("Property_Type", "Apartment"),
            ("Furnishing_Status", "Unfurnished"),
            ("Year_Built", "2010"),
            ("Gated_Community", "No"),
            ("Balcony", "Yes"),
            ("Floors", "4"),
            ("Facing_Direction", "North"),
        ];
        let rec = PropertyRecord::from_pairs(pairs).unwrap();
        assert!((rec.area_sqft - 1200.0).abs() < 1e-12);
        assert_eq!(rec.year_built, 2010);
    }

    #[test]
    fn numeric_looking_flags_match_csv_typing() {
        use crate::preprocess::categorical::CategoricalColumn;

        let trained = [Cell::parse("1.0"), Cell::parse("0.0"), Cell::parse("1")];
        let balcony = CategoricalColumn::fit(BALCONY, &trained).unwrap();

        for value in [json!("1.0"), json!(1.0), json!(1), json!(" 1 ")] {
            let mut body = sample_json();
            body["Balcony"] = value.clone();
            let table = PropertyRecord::from_json(&body).unwrap().to_table();
            let cell = &table.column(BALCONY).unwrap()[0];

            let mut out = vec![0.0; balcony.width()];
            balcony.encode(cell, &mut out);
            assert_eq!(out.iter().sum::<f64>(), 1.0, "{value} should hit a known label");
            assert_eq!(cell.category().as_deref(), Some("1"));
        }
    }

    #[test]
    fn boolean_flags_are_malformed() {
        let mut body = sample_json();
        body["Gated_Community"] = json!(true);
        let err = PropertyRecord::from_json(&body).unwrap_err();
        assert_eq!(err.malformed[0].0, "Gated_Community");
    }

    #[test]
    fn out_of_range_integers_are_malformed() {
        for value in [json!(1e30), json!("-1e19"), json!(f64::from(u32::MAX) * 4e9)] {
            let mut body = sample_json();
            body["Bedrooms"] = value;
            let err = PropertyRecord::from_json(&body).unwrap_err();
            assert_eq!(err.malformed, vec![("Bedrooms".to_string(), "expected a whole number".to_string())]);
        }

        let mut body = sample_json();
        body["Bedrooms"] = json!(4.0);
        assert_eq!(PropertyRecord::from_json(&body).unwrap().bedrooms, 4);
    }
}
