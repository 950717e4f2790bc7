use crate::domain::model::{Column, OutputFormat};
use crate::utils::error::{GdtError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub extraction: Option<ExtractionConfig>,
    pub output: Option<OutputConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub geometric_limits: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub formats: Option<Vec<String>>,
    pub bundle: Option<bool>,
    pub sort_by: Option<String>,
    pub show_table: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GdtError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GdtError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            GdtError::ConfigValidationError {
                field: "env_substitution".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = self.output_path() {
            crate::utils::validation::validate_path("output.path", path)?;
        }
        self.formats()?;
        self.sort_by()?;
        Ok(())
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref()?.path.as_deref()
    }

    pub fn formats(&self) -> Result<Option<Vec<OutputFormat>>> {
        let Some(formats) = self.output.as_ref().and_then(|o| o.formats.as_ref()) else {
            return Ok(None);
        };
        formats
            .iter()
            .map(|f| {
                f.parse::<OutputFormat>()
                    .map_err(|reason| GdtError::InvalidConfigValueError {
                        field: "output.formats".to_string(),
                        value: f.clone(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn sort_by(&self) -> Result<Option<Column>> {
        let Some(column) = self.output.as_ref().and_then(|o| o.sort_by.as_ref()) else {
            return Ok(None);
        };
        column
            .parse::<Column>()
            .map(Some)
            .map_err(|reason| GdtError::InvalidConfigValueError {
                field: "output.sort_by".to_string(),
                value: column.clone(),
                reason,
            })
    }

    pub fn bundle(&self) -> Option<bool> {
        self.output.as_ref()?.bundle
    }

    pub fn show_table(&self) -> Option<bool> {
        self.output.as_ref()?.show_table
    }

    pub fn geometric_limits(&self) -> Option<bool> {
        self.extraction.as_ref()?.geometric_limits
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[extraction]
geometric_limits = true

[output]
path = "./reports"
formats = ["csv", ".xlsx", "JSON"]
bundle = true
sort_by = "datum"
show_table = false

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.output_path(), Some("./reports"));
        assert_eq!(
            config.formats().unwrap(),
            Some(vec![OutputFormat::Csv, OutputFormat::Xlsx, OutputFormat::Json])
        );
        assert_eq!(config.sort_by().unwrap(), Some(Column::Datum));
        assert_eq!(config.bundle(), Some(true));
        assert_eq!(config.show_table(), Some(false));
        assert_eq!(config.geometric_limits(), Some(true));
        assert!(config.monitoring_enabled());
    }

    #[test]
    fn test_empty_config_has_no_overrides() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.output_path(), None);
        assert_eq!(config.formats().unwrap(), None);
        assert_eq!(config.geometric_limits(), None);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GDT_TEST_OUTPUT_DIR", "/tmp/gdt-reports");

        let toml_content = r#"
[output]
path = "${GDT_TEST_OUTPUT_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), Some("/tmp/gdt-reports"));

        std::env::remove_var("GDT_TEST_OUTPUT_DIR");
    }

    #[test]
    fn test_unknown_variable_is_kept() {
        let config =
            TomlConfig::from_toml_str("[output]\npath = \"${GDT_TEST_UNSET_VARIABLE}\"\n").unwrap();
        assert_eq!(config.output_path(), Some("${GDT_TEST_UNSET_VARIABLE}"));
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[output]\nformats = [\"pdf\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            GdtError::InvalidConfigValueError { ref field, .. } if field == "output.formats"
        ));

        let config = TomlConfig::from_toml_str("[output]\nsort_by = \"colour\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = TomlConfig::from_toml_str("[output\npath = 1").unwrap_err();
        assert!(matches!(err, GdtError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\nformats = [\"txt\"]\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.formats().unwrap(), Some(vec![OutputFormat::Txt]));
    }
}
