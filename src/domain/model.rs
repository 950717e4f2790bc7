use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column titles of the tolerance table, in display order.
pub const HEADERS: [&str; 8] = [
    "Type",
    "Value",
    "Datum",
    "Location",
    "Surface",
    "Tolerance Value",
    "Upper Limit",
    "Lower Limit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Geometric,
    Dimensional,
    Datum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRow {
    pub kind: RowKind,
    #[serde(rename = "type")]
    pub type_label: String,
    pub value: String,
    pub datum: String,
    pub location: String,
    pub surface: String,
    pub tolerance_value: String,
    pub upper_limit: String,
    pub lower_limit: String,
}

impl ToleranceRow {
    pub fn cells(&self) -> [&str; 8] {
        [
            self.type_label.as_str(),
            self.value.as_str(),
            self.datum.as_str(),
            self.location.as_str(),
            self.surface.as_str(),
            self.tolerance_value.as_str(),
            self.upper_limit.as_str(),
            self.lower_limit.as_str(),
        ]
    }

    pub fn cell(&self, column: Column) -> &str {
        self.cells()[column.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Type,
    Value,
    Datum,
    Location,
    Surface,
    ToleranceValue,
    UpperLimit,
    LowerLimit,
}

impl Column {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "type" => Ok(Column::Type),
            "value" => Ok(Column::Value),
            "datum" => Ok(Column::Datum),
            "location" => Ok(Column::Location),
            "surface" => Ok(Column::Surface),
            "tolerance_value" => Ok(Column::ToleranceValue),
            "upper_limit" => Ok(Column::UpperLimit),
            "lower_limit" => Ok(Column::LowerLimit),
            _ => Err(format!("unknown column '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Txt,
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" => Ok(OutputFormat::Txt),
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub geometric: usize,
    pub dimensional: usize,
    pub dimensional_with_datum: usize,
    pub datums: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_rows(rows: &[ToleranceRow]) -> Self {
        let count = |kind: RowKind| rows.iter().filter(|r| r.kind == kind).count();
        Self {
            geometric: count(RowKind::Geometric),
            dimensional: count(RowKind::Dimensional),
            dimensional_with_datum: rows
                .iter()
                .filter(|r| r.kind == RowKind::Dimensional && !r.datum.is_empty())
                .count(),
            datums: count(RowKind::Datum),
            total: rows.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub schemas: Vec<String>,
    pub summary: Summary,
    pub rows: Vec<ToleranceRow>,
}

impl ExtractionReport {
    pub fn new(source: impl Into<String>, schemas: Vec<String>, rows: Vec<ToleranceRow>) -> Self {
        Self {
            source: source.into(),
            generated_at: Utc::now(),
            schemas,
            summary: Summary::from_rows(&rows),
            rows,
        }
    }

    /// Stable sort on the cell text, like clicking a column header.
    pub fn sort_by(&mut self, column: Column) {
        self.rows.sort_by(|a, b| a.cell(column).cmp(b.cell(column)));
    }
}
