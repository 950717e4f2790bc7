use crate::domain::model::{ExtractionReport, RowKind, HEADERS};
use crate::utils::error::{GdtError, Result};
use umya_spreadsheet::structs::HorizontalAlignmentValues;
use umya_spreadsheet::{PatternValues, Style, Worksheet};

const SHEET_TITLE: &str = "GD&T & Dimensional Tolerances";
const HEADER_FILL: &str = "FF4CAF50";
const DATUM_FILL: &str = "FFFFF3CD";
const DIMENSIONAL_FILL: &str = "FFE8F5E8";
const DIMENSIONAL_FONT: &str = "FF2E7D32";
const TOLERANCE_FILL: &str = "FFE3F2FD";
const MAX_COLUMN_WIDTH: usize = 50;

fn column_letter(n: usize) -> String {
    let mut result = String::new();
    let mut n = n;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

fn coordinate(column: usize, row: usize) -> String {
    format!("{}{}", column_letter(column), row)
}

fn fill(style: &mut Style, argb: &str) {
    let pattern = style.get_fill_mut().get_pattern_fill_mut();
    pattern.set_pattern_type(PatternValues::Solid);
    pattern.get_foreground_color_mut().set_argb(argb);
}

fn write_header(sheet: &mut Worksheet) {
    for (idx, header) in HEADERS.iter().enumerate() {
        let cell = sheet.get_cell_mut(coordinate(idx + 1, 1).as_str());
        cell.set_value_string(*header);
        let style = cell.get_style_mut();
        style.get_font_mut().set_bold(true);
        style.get_font_mut().get_color_mut().set_argb("FFFFFFFF");
        fill(style, HEADER_FILL);
        style
            .get_alignment_mut()
            .set_horizontal(HorizontalAlignmentValues::Center);
    }
}

fn write_rows(sheet: &mut Worksheet, report: &ExtractionReport) {
    for (row_idx, row) in report.rows.iter().enumerate() {
        let row_number = row_idx + 2;
        for (col_idx, value) in row.cells().iter().enumerate() {
            let column = col_idx + 1;
            let cell = sheet.get_cell_mut(coordinate(column, row_number).as_str());
            cell.set_value_string(*value);
            let style = cell.get_style_mut();

            match row.kind {
                RowKind::Datum => {
                    fill(style, DATUM_FILL);
                    if column == 1 {
                        style.get_font_mut().set_bold(true);
                    }
                }
                RowKind::Dimensional => {
                    fill(style, DIMENSIONAL_FILL);
                    if column == 1 {
                        style.get_font_mut().set_bold(true);
                        style.get_font_mut().get_color_mut().set_argb(DIMENSIONAL_FONT);
                    }
                }
                RowKind::Geometric => {
                    if column >= 6 && !value.is_empty() && *value != "N/A" {
                        fill(style, TOLERANCE_FILL);
                    }
                }
            }
        }
    }
}

fn set_column_widths(sheet: &mut Worksheet, report: &ExtractionReport) {
    for (idx, header) in HEADERS.iter().enumerate() {
        let longest = report
            .rows
            .iter()
            .map(|r| r.cells()[idx].chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or_default();
        let width = (longest + 2).min(MAX_COLUMN_WIDTH);
        sheet
            .get_column_dimension_mut(&column_letter(idx + 1))
            .set_width(width as f64);
    }
}

fn write_summary(sheet: &mut Worksheet, report: &ExtractionReport) {
    let summary = &report.summary;
    let first = report.rows.len() + 3;

    let title = sheet.get_cell_mut(coordinate(1, first).as_str());
    title.set_value_string("SUMMARY:");
    title.get_style_mut().get_font_mut().set_bold(true);

    let lines = [
        format!("Geometric Tolerances: {}", summary.geometric),
        format!("Dimensional Tolerances: {}", summary.dimensional),
        format!("Dimensional with Datums: {}", summary.dimensional_with_datum),
        format!("Datums: {}", summary.datums),
        format!("Total Items: {}", summary.total),
    ];
    for (offset, line) in lines.into_iter().enumerate() {
        sheet
            .get_cell_mut(coordinate(1, first + offset + 1).as_str())
            .set_value_string(line);
    }
}

pub(super) fn to_xlsx(report: &ExtractionReport) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| GdtError::SpreadsheetError {
            message: "new workbook has no default sheet".to_string(),
        })?;
    sheet.set_name(SHEET_TITLE);

    write_header(sheet);
    write_rows(sheet, report);
    set_column_widths(sheet, report);
    write_summary(sheet, report);

    let mut buffer = std::io::Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer).map_err(|e| {
        GdtError::SpreadsheetError {
            message: e.to_string(),
        }
    })?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(8), "H");
        assert_eq!(column_letter(27), "AA");
    }
}
