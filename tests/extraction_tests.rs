use gdt_extract::core::pipeline::StepPipeline;
use gdt_extract::utils::error::{ErrorSeverity, GdtError};
use gdt_extract::{Column, ExtractionEngine, LocalStorage, OutputFormat, RunConfig};
use std::path::Path;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn engine_for(
    input: &str,
    output_dir: &TempDir,
    config: RunConfig,
) -> ExtractionEngine<StepPipeline<LocalStorage, RunConfig>> {
    let sink = LocalStorage::new(output_dir.path().to_string_lossy().to_string());
    let pipeline = StepPipeline::new(input, LocalStorage::new("."), sink, config);
    ExtractionEngine::new(pipeline)
}

fn config(formats: Vec<OutputFormat>) -> RunConfig {
    RunConfig {
        inputs: vec![fixture("bracket.step")],
        formats,
        ..RunConfig::default()
    }
}

const EXPECTED_ROWS: [[&str; 8]; 6] = [
    [
        "⌀ Cylindricity",
        "0.05",
        "A",
        "cylindrical side",
        "curved side of the cylinder",
        "",
        "",
        "",
    ],
    [
        "☐ Flatness",
        "0.05",
        "D",
        "bottom face",
        "bottom face",
        "",
        "",
        "",
    ],
    [
        "⌀ Diameter",
        "20.0",
        "A",
        "cylindrical side",
        "curved side of the cylinder",
        "±0.100",
        "20.100",
        "19.900",
    ],
    [
        "↔ Distance",
        "35.0",
        "A",
        "between planes",
        "planar faces",
        "",
        "",
        "",
    ],
    [
        "Datum",
        "A",
        "A",
        "cylindrical side",
        "cylindrical side",
        "",
        "",
        "",
    ],
    [
        "Datum",
        "D",
        "D",
        "bottom face",
        "bottom face",
        "",
        "",
        "",
    ],
];

#[tokio::test]
async fn test_end_to_end_csv_and_txt() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &fixture("bracket.step"),
        &temp_dir,
        config(vec![OutputFormat::Csv, OutputFormat::Txt]),
    );

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome.outputs.len(), 2);
    assert!(outcome.outputs[0].ends_with("bracket_tolerances.csv"));
    assert!(outcome.outputs[1].ends_with("bracket_tolerances.txt"));

    let summary = &outcome.report.summary;
    assert_eq!(summary.geometric, 2);
    assert_eq!(summary.dimensional, 2);
    assert_eq!(summary.dimensional_with_datum, 2);
    assert_eq!(summary.datums, 2);
    assert_eq!(summary.total, 6);

    let csv_path = temp_dir.path().join("bracket_tolerances.csv");
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        gdt_extract::domain::model::HEADERS.to_vec()
    );
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    let expected: Vec<Vec<String>> = EXPECTED_ROWS
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    assert_eq!(rows, expected);

    let txt = std::fs::read_to_string(temp_dir.path().join("bracket_tolerances.txt")).unwrap();
    assert_eq!(txt.lines().count(), 2 + EXPECTED_ROWS.len());
    assert!(txt.contains("⌀ Diameter\t20.0\tA\tcylindrical side"));
}

#[tokio::test]
async fn test_schema_is_reported_in_json() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &fixture("bracket.step"),
        &temp_dir,
        config(vec![OutputFormat::Json]),
    );
    engine.run().await.unwrap();

    let data = std::fs::read(temp_dir.path().join("bracket_tolerances.json")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&data).unwrap();

    assert_eq!(json["summary"]["total"], 6);
    assert_eq!(json["rows"][0]["type"], "⌀ Cylindricity");
    assert_eq!(json["rows"][2]["tolerance_value"], "±0.100");
    assert!(json["schemas"][0]
        .as_str()
        .unwrap()
        .starts_with("AP242_MANAGED_MODEL_BASED_3D_ENGINEERING_MIM_LF"));
    assert!(json["generated_at"].is_string());
}

#[tokio::test]
async fn test_xlsx_layout_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &fixture("bracket.step"),
        &temp_dir,
        config(vec![OutputFormat::Xlsx]),
    );
    engine.run().await.unwrap();

    let path = temp_dir.path().join("bracket_tolerances.xlsx");
    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book
        .get_sheet_by_name("GD&T & Dimensional Tolerances")
        .unwrap();

    assert_eq!(sheet.get_value("A1"), "Type");
    assert_eq!(sheet.get_value("H1"), "Lower Limit");
    assert_eq!(sheet.get_value("A2"), "⌀ Cylindricity");
    assert_eq!(sheet.get_value("G4"), "20.100");
    assert_eq!(sheet.get_value("B7"), "D");

    // Six rows start at row 2; the summary block sits three rows below the header.
    assert_eq!(sheet.get_value("A9"), "SUMMARY:");
    assert_eq!(sheet.get_value("A10"), "Geometric Tolerances: 2");
    assert_eq!(sheet.get_value("A12"), "Dimensional with Datums: 2");
    assert_eq!(sheet.get_value("A14"), "Total Items: 6");
}

#[tokio::test]
async fn test_bundle_writes_single_zip() {
    let temp_dir = TempDir::new().unwrap();
    let mut run_config = config(vec![
        OutputFormat::Txt,
        OutputFormat::Csv,
        OutputFormat::Xlsx,
        OutputFormat::Json,
    ]);
    run_config.bundle = true;
    let engine = engine_for(&fixture("bracket.step"), &temp_dir, run_config);

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome.outputs.len(), 1);
    let zip_path = temp_dir.path().join("bracket_tolerances.zip");
    assert!(zip_path.exists());
    assert!(!temp_dir.path().join("bracket_tolerances.csv").exists());

    let zip_data = std::fs::read(&zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 4);

    let mut csv_file = archive.by_name("bracket_tolerances.csv").unwrap();
    let mut csv_content = String::new();
    std::io::Read::read_to_string(&mut csv_file, &mut csv_content).unwrap();
    assert!(csv_content.starts_with("Type,Value,Datum"));
    assert!(csv_content.contains("↔ Distance,35.0,A,between planes,planar faces"));
}

#[tokio::test]
async fn test_sorting_and_geometric_limits() {
    let temp_dir = TempDir::new().unwrap();
    let mut run_config = config(vec![OutputFormat::Txt]);
    run_config.sort_by = Some(Column::Datum);
    run_config.geometric_limits = true;
    let engine = engine_for(&fixture("bracket.step"), &temp_dir, run_config);

    let outcome = engine.run().await.unwrap();
    let rows = &outcome.report.rows;

    let order: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.type_label.as_str(), r.datum.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("⌀ Cylindricity", "A"),
            ("⌀ Diameter", "A"),
            ("↔ Distance", "A"),
            ("Datum", "A"),
            ("☐ Flatness", "D"),
            ("Datum", "D"),
        ]
    );

    let flatness = &rows[4];
    assert_eq!(flatness.tolerance_value, "±0.05");
    assert_eq!(flatness.upper_limit, "0.05");
    assert_eq!(flatness.lower_limit, "0.0");
}

#[tokio::test]
async fn test_missing_input_is_critical() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &fixture("no_such_part.step"),
        &temp_dir,
        config(vec![OutputFormat::Csv]),
    );

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, GdtError::IoError(_)));
    assert_eq!(err.severity(), ErrorSeverity::Critical);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_truncated_file_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("broken.step");
    std::fs::write(
        &input,
        "ISO-10303-21;\nDATA;\n#1=DATUM('Datum29@Boss1(A)',$,#5,.F.,'A');\n#2=DATUM('Datum28@Pla",
    )
    .unwrap();
    let output_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &input.to_string_lossy(),
        &output_dir,
        config(vec![OutputFormat::Csv]),
    );

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, GdtError::ParseError { .. }));
    assert_eq!(err.severity(), ErrorSeverity::Medium);
}

#[tokio::test]
async fn test_file_without_annotations_writes_header_only() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("plain.stp");
    std::fs::write(
        &input,
        "ISO-10303-21;\nDATA;\n#1=CARTESIAN_POINT('',(0.,0.,0.));\nENDSEC;\nEND-ISO-10303-21;\n",
    )
    .unwrap();
    let output_dir = TempDir::new().unwrap();
    let engine = engine_for(
        &input.to_string_lossy(),
        &output_dir,
        config(vec![OutputFormat::Csv]),
    );

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome.report.summary.total, 0);
    let csv = std::fs::read_to_string(output_dir.path().join("plain_tolerances.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
