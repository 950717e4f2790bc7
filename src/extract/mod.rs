//! Turns a parsed STEP file into tolerance table rows.
//!
//! Rows come out in a fixed order: geometric tolerances, dimensional sizes,
//! dimensional locations, then one row per datum letter.

pub mod datum;
pub mod dimensional;
pub mod geometric;
pub mod limits;
pub mod surface;

use crate::domain::model::{RowKind, ToleranceRow};
use crate::step::StepFile;
use datum::DatumTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Fill tolerance value and zone limits for geometric tolerances.
    pub geometric_limits: bool,
}

pub fn extract_rows(file: &StepFile, options: ExtractOptions) -> Vec<ToleranceRow> {
    let datums = DatumTable::from_step(file);

    let mut rows = geometric::extract(file, &datums, options.geometric_limits);
    rows.extend(dimensional::extract(file, &datums));

    for (letter, _) in datums.features() {
        let location = datums.location(letter).unwrap_or("surface").to_string();
        rows.push(ToleranceRow {
            kind: RowKind::Datum,
            type_label: "Datum".to_string(),
            value: letter.to_string(),
            datum: letter.to_string(),
            surface: location.clone(),
            location,
            tolerance_value: String::new(),
            upper_limit: String::new(),
            lower_limit: String::new(),
        });
    }

    tracing::debug!(
        "Extracted {} rows from {} entities ({} datums)",
        rows.len(),
        file.len(),
        datums.features().count()
    );

    rows
}
