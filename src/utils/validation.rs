use crate::utils::error::{GdtError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(GdtError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(GdtError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_not_empty<T>(field_name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(GdtError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

/// Extensions are compared case-insensitively (`PART.STP` is a STEP file).
pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        validate_path(field_name, file)?;

        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) => {
                if !allowed_set.contains(extension.to_ascii_lowercase().as_str()) {
                    return Err(GdtError::InvalidConfigValueError {
                        field: field_name.to_string(),
                        value: file.clone(),
                        reason: format!(
                            "Unsupported file extension: {}. Allowed extensions: {}",
                            extension,
                            allowed_extensions.join(", ")
                        ),
                    });
                }
            }
            None => {
                return Err(GdtError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Rejects inputs whose file stems match, ignoring case and directory:
/// their `<stem>_tolerances.*` outputs would land on the same paths.
pub fn validate_unique_stems(field_name: &str, files: &[String]) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();

    for file in files {
        let stem = std::path::Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !seen.insert(stem.clone()) {
            return Err(GdtError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: format!(
                    "Another input also has the file name '{}'; its outputs would be overwritten",
                    stem
                ),
            });
        }
    }

    Ok(())
}
