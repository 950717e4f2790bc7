//! Writers for the tolerance table.

mod xlsx;

use crate::domain::model::{ExtractionReport, OutputFormat, ToleranceRow, HEADERS};
use crate::utils::error::{GdtError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub fn render(format: OutputFormat, report: &ExtractionReport) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Txt => Ok(to_txt(&report.rows).into_bytes()),
        OutputFormat::Csv => to_csv(&report.rows),
        OutputFormat::Xlsx => xlsx::to_xlsx(report),
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
    }
}

pub fn to_txt(rows: &[ToleranceRow]) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join("\t"));
    out.push('\n');
    out.push_str(&"=".repeat(120));
    out.push('\n');
    for row in rows {
        out.push_str(&row.cells().join("\t"));
        out.push('\n');
    }
    out
}

pub fn to_csv(rows: &[ToleranceRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.into_inner().map_err(|e| GdtError::IoError(e.into_error()))
}

/// Packs already rendered files into one zip archive.
pub fn bundle(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Column-aligned table for the terminal.
pub fn render_table(rows: &[ToleranceRow]) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&HEADERS));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(&row.cells()));
        out.push('\n');
    }
    out
}
