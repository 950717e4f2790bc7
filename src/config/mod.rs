pub mod cli;
pub mod toml_config;

use crate::domain::model::{Column, OutputFormat};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_not_empty, validate_path, validate_unique_stems,
    Validate,
};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

pub const INPUT_EXTENSIONS: [&str; 3] = ["step", "stp", "txt"];
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

/// Settings for one run after CLI flags and the config file are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub inputs: Vec<String>,
    pub output_path: String,
    pub formats: Vec<OutputFormat>,
    pub bundle: bool,
    pub sort_by: Option<Column>,
    pub geometric_limits: bool,
    pub show_table: bool,
    pub monitor: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            formats: vec![OutputFormat::Xlsx],
            bundle: false,
            sort_by: None,
            geometric_limits: false,
            show_table: true,
            monitor: false,
        }
    }
}

impl RunConfig {
    /// Overlays the values present in a config file.
    pub fn apply_toml(&mut self, file: &TomlConfig) -> Result<()> {
        if let Some(path) = file.output_path() {
            self.output_path = path.to_string();
        }
        if let Some(formats) = file.formats()? {
            self.formats = formats;
        }
        if let Some(column) = file.sort_by()? {
            self.sort_by = Some(column);
        }
        if let Some(bundle) = file.bundle() {
            self.bundle = bundle;
        }
        if let Some(show_table) = file.show_table() {
            self.show_table = show_table;
        }
        if let Some(limits) = file.geometric_limits() {
            self.geometric_limits = limits;
        }
        self.monitor |= file.monitoring_enabled();
        Ok(())
    }

    pub fn dedup_formats(&mut self) {
        let mut seen = Vec::with_capacity(self.formats.len());
        self.formats.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });
    }
}

impl ConfigProvider for RunConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn bundle(&self) -> bool {
        self.bundle
    }

    fn sort_by(&self) -> Option<Column> {
        self.sort_by
    }

    fn geometric_limits(&self) -> bool {
        self.geometric_limits
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_not_empty("inputs", &self.inputs)?;
        validate_file_extensions("inputs", &self.inputs, &INPUT_EXTENSIONS)?;
        validate_unique_stems("inputs", &self.inputs)?;
        validate_path("output_path", &self.output_path)?;
        validate_not_empty("formats", &self.formats)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "gdt-extract", version)]
#[command(about = "Extract GD&T and dimensional tolerances from STEP files")]
pub struct CliConfig {
    /// STEP files to read (.step, .stp or .txt)
    pub inputs: Vec<String>,

    /// Output directory [default: ./output]
    #[arg(short, long)]
    pub output_path: Option<String>,

    /// Output formats, comma separated [default: xlsx]
    #[arg(short, long = "format", value_delimiter = ',', value_enum)]
    pub formats: Vec<OutputFormat>,

    /// Pack every output of an input into one zip archive
    #[arg(long)]
    pub bundle: bool,

    #[arg(long, value_enum)]
    pub sort_by: Option<Column>,

    /// Fill tolerance value and zone limits for geometric tolerances
    #[arg(long)]
    pub geometric_limits: bool,

    /// Do not print the table to the terminal
    #[arg(long)]
    pub no_table: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Validate configuration and list the planned outputs without reading inputs
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Command line flags win over the config file, which wins over defaults.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = RunConfig {
            inputs: self.inputs.clone(),
            ..RunConfig::default()
        };

        if let Some(path) = &self.config {
            tracing::debug!("Loading configuration from {}", path);
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            config.apply_toml(&file)?;
        }

        if let Some(path) = &self.output_path {
            config.output_path = path.clone();
        }
        if !self.formats.is_empty() {
            config.formats = self.formats.clone();
        }
        if self.sort_by.is_some() {
            config.sort_by = self.sort_by;
        }
        config.bundle |= self.bundle;
        config.geometric_limits |= self.geometric_limits;
        config.monitor |= self.monitor;
        if self.no_table {
            config.show_table = false;
        }

        config.dedup_formats();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::GdtError;

    fn config_with_inputs(inputs: &[&str]) -> RunConfig {
        RunConfig {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.output_path, "./output");
        assert_eq!(config.formats, vec![OutputFormat::Xlsx]);
        assert!(config.show_table);
        assert!(!config.bundle);
    }

    #[test]
    fn test_validate_inputs() {
        assert!(config_with_inputs(&["part.step", "PART2.STP", "dump.txt"])
            .validate()
            .is_ok());

        let err = config_with_inputs(&[]).validate().unwrap_err();
        assert!(matches!(err, GdtError::MissingConfigError { .. }));

        let err = config_with_inputs(&["drawing.pdf"]).validate().unwrap_err();
        assert!(matches!(err, GdtError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_validate_rejects_inputs_sharing_output_names() {
        let err = config_with_inputs(&["left/part.step", "right/part.step"])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            GdtError::InvalidConfigValueError { ref field, .. } if field == "inputs"
        ));
        assert!(config_with_inputs(&["left/part.step", "right/part2.step"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_requires_a_format() {
        let mut config = config_with_inputs(&["part.step"]);
        config.formats.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_toml_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            r#"
[output]
path = "reports"
formats = ["csv", "json"]
show_table = false

[extraction]
geometric_limits = true
"#,
        )
        .unwrap();

        let mut config = RunConfig::default();
        config.apply_toml(&file).unwrap();
        assert_eq!(config.output_path, "reports");
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Json]);
        assert!(!config.show_table);
        assert!(config.geometric_limits);
        assert!(!config.bundle);
    }

    #[test]
    fn test_dedup_formats_keeps_first_occurrence() {
        let mut config = RunConfig {
            formats: vec![OutputFormat::Csv, OutputFormat::Txt, OutputFormat::Csv],
            ..RunConfig::default()
        };
        config.dedup_formats();
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Txt]);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_flags_win_over_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[output]\npath = \"from-file\"\nformats = [\"txt\"]\nbundle = true\n")
            .unwrap();
        let config_path = file.path().to_string_lossy().to_string();

        let cli = CliConfig::parse_from([
            "gdt-extract",
            "part.step",
            "--config",
            config_path.as_str(),
            "--format",
            "csv,xlsx",
            "--sort-by",
            "upper-limit",
            "--no-table",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.inputs, vec!["part.step".to_string()]);
        assert_eq!(config.output_path, "from-file");
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Xlsx]);
        assert_eq!(config.sort_by, Some(Column::UpperLimit));
        assert!(config.bundle);
        assert!(!config.show_table);
    }
}
