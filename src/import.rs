//! CSV roster parsing: `first_name,last_name,gender,weight_kg,birth_date,belt,team`.

use crate::models::{Gender, TournamentError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RosterRecord {
    first_name: String,
    last_name: String,
    gender: String,
    weight_kg: String,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    belt: Option<String>,
    #[serde(default)]
    team: Option<String>,
}

/// One validated roster line.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterRow {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub weight_kg: f64,
    pub birth_date: Option<NaiveDate>,
    pub belt: Option<String>,
    pub team: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub athletes_created: usize,
    pub teams_created: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse and validate the whole roster. Row numbers in errors count the header as row 1.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<RosterRow>, TournamentError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<RosterRecord>().enumerate() {
        let row = i + 2;
        let err = |message: String| TournamentError::Import { row, message };
        let record = result.map_err(|e| err(e.to_string()))?;

        let first_name = record.first_name.trim().to_string();
        let last_name = record.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(err("first_name and last_name are required".into()));
        }
        let gender: Gender = record.gender.parse().map_err(err)?;
        let weight_kg: f64 = record
            .weight_kg
            .trim()
            .parse()
            .map_err(|_| err(format!("invalid weight '{}'", record.weight_kg)))?;
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(err(format!("invalid weight '{}'", record.weight_kg)));
        }
        let birth_date = match non_empty(record.birth_date) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| err(format!("invalid birth_date '{}', expected YYYY-MM-DD", raw)))?,
            ),
            None => None,
        };

        rows.push(RosterRow {
            first_name,
            last_name,
            gender,
            weight_kg,
            birth_date,
            belt: non_empty(record.belt),
            team: non_empty(record.team),
        });
    }
    Ok(rows)
}
