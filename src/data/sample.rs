//! Synthetic Hyderabad transaction table.
//!
//! Prices follow a multiplicative model so every feature carries signal:
//!
//! ```text
//! price = area * location_rate * type * furnishing * amenities * (1 - age_decay * age) * exp(σ z)
//! ```
//!
//! The generator is fully determined by `(rows, seed)`, which keeps training
//! tests reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::domain::*;

/// Locality names used for sampling.
pub const LOCATIONS: [&str; 30] = [
    "Ameerpet",
    "Attapur",
    "Bachupally",
    "Banjara Hills",
    "Begumpet",
    "Gachibowli",
    "Hitech City",
    "Jubilee Hills",
    "Kollur",
    "Kompally",
    "Kondapur",
    "Kukatpally",
    "LB Nagar",
    "Madhapur",
    "Manikonda",
    "Mehdipatnam",
    "Miyapur",
    "Nallagandla",
    "Narsingi",
    "Nizampet",
    "Patancheru",
    "Pocharam",
    "Punjagutta",
    "Rajendra Nagar",
    "Rampally",
    "Secunderabad",
    "Shamshabad",
    "Somajiguda",
    "Tolichowki",
    "Uppal",
];

const PROPERTY_TYPES: [(&str, f64); 3] = [("Apartment", 1.0), ("Villa", 1.35), ("Independent House", 1.15)];
const FURNISHING: [(&str, f64); 3] = [("Unfurnished", 1.0), ("Semi-Furnished", 1.05), ("Fully-Furnished", 1.10)];
const FACING: [&str; 4] = ["East", "North", "South", "West"];

/// Log-price noise.
const NOISE_SIGMA: f64 = 0.08;
/// Per-year depreciation.
const AGE_DECAY: f64 = 0.008;
/// Probability that an optional feature cell is left blank.
const MISSING_PROB: f64 = 0.02;

/// Sample-table columns, in output order.
pub fn sample_columns() -> Vec<String> {
    [
        "Property_ID",
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
        "Transaction_Date",
        "Amenities_Score",
        "Price_per_SqFt",
        PRICE_LAKHS,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Per-sqft rate (lakhs) for a location index.
fn location_rate(idx: usize) -> f64 {
    0.040 + 0.0035 * ((idx * 7) % 13) as f64
}

pub fn generate_sample(rows: usize, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = Table::new(sample_columns());

    for i in 0..rows {
        let loc_idx = rng.gen_range(0..LOCATIONS.len());
        let (ptype, type_factor) = PROPERTY_TYPES[rng.gen_range(0..PROPERTY_TYPES.len())];
        let (furnishing, furnish_factor) = FURNISHING[rng.gen_range(0..FURNISHING.len())];
        let facing = FACING[rng.gen_range(0..FACING.len())];

        let area: f64 = match ptype {
            "Villa" => rng.gen_range(2200.0..4500.0),
            "Independent House" => rng.gen_range(1200.0..3000.0),
            _ => rng.gen_range(550.0..2400.0),
        };
        let area = area.round();
        let bedrooms = ((area / 600.0).floor() as i64 + 1).clamp(1, 5);
        let bathrooms = if rng.gen_bool(0.6) { bedrooms } else { (bedrooms - 1).max(1) };
        let floors: i64 = match ptype {
            "Apartment" => rng.gen_range(2..31),
            "Villa" => rng.gen_range(1..4),
            _ => rng.gen_range(1..5),
        };
        let year_built: i64 = rng.gen_range(1990..2025);
        let gated = rng.gen_bool(0.55);
        let balcony = rng.gen_bool(0.7);
        let amenities: f64 = rng.gen_range(1.0..10.0);

        let age = (DEFAULT_REFERENCE_YEAR as i64 - year_built) as f64;
        let z: f64 = rng.sample(StandardNormal);
        let gated_factor = if gated { 1.08 } else { 1.0 };
        let balcony_factor = if balcony { 1.03 } else { 1.0 };
        let price = area
            * location_rate(loc_idx)
            * type_factor
            * furnish_factor
            * gated_factor
            * balcony_factor
            * (1.0 + 0.01 * amenities)
            * (1.0 - AGE_DECAY * age)
            * (NOISE_SIGMA * z).exp();
        let price = (price * 100.0).round() / 100.0;

        let mut maybe_blank = |cell: Cell| if rng.r#gen::<f64>() < MISSING_PROB { Cell::Missing } else { cell };

        let row = vec![
            Cell::Text(format!("HYD-{:05}", i + 1)),
            Cell::Text(LOCATIONS[loc_idx].to_string()),
            maybe_blank(Cell::Number(area)),
            maybe_blank(Cell::Number(bedrooms as f64)),
            Cell::Number(bathrooms as f64),
            Cell::Text(ptype.to_string()),
            maybe_blank(Cell::Text(furnishing.to_string())),
            Cell::Number(year_built as f64),
            Cell::Text(yes_no(gated)),
            Cell::Text(yes_no(balcony)),
            Cell::Number(floors as f64),
            Cell::Text(facing.to_string()),
            Cell::Text(format!("2024-{:02}-{:02}", 1 + i % 12, 1 + i % 28)),
            Cell::Number((amenities * 10.0).round() / 10.0),
            Cell::Number((price * 100_000.0 / area).round()),
            Cell::Number(price),
        ];
        table.push_row(row);
    }

    table
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}
