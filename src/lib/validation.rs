//! Input validation helpers for command-line parameters and paths.
//!
//! Failures are reported as [`SvPrepError`] values naming the offending parameter.

use std::fmt::Display;
use std::path::Path;

use crate::errors::{Result, SvPrepError};

/// Validates that a file exists.
///
/// ```
/// use svprep_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.bam", "Input BAM").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SvPrepError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validates that the parent directory of an output path exists.
pub fn validate_output_dir<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(SvPrepError::InvalidFileFormat {
                file_type: description.to_string(),
                path: path.display().to_string(),
                reason: format!("Output directory {} does not exist", parent.display()),
            })
        }
        _ => Ok(()),
    }
}

/// Validates that `max` is not below `min`.
///
/// ```
/// use svprep_lib::validation::validate_min_max;
///
/// validate_min_max(0, 1000, "min-frag-length", "max-frag-length").unwrap();
/// assert!(validate_min_max(500, 100, "min-frag-length", "max-frag-length").is_err());
/// ```
pub fn validate_min_max<T: Ord + Display>(min: T, max: T, min_name: &str, max_name: &str) -> Result<()> {
    if max < min {
        return Err(SvPrepError::InvalidParameter {
            parameter: max_name.to_string(),
            reason: format!("{max_name} ({max}) must be >= {min_name} ({min})"),
        });
    }
    Ok(())
}

/// Validates that a value is greater than zero.
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(SvPrepError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

/// Validates that a value is a percentage in `0..=100`.
pub fn validate_percentage(value: u32, name: &str) -> Result<()> {
    if value > 100 {
        return Err(SvPrepError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("{value} is not a percentage"),
        });
    }
    Ok(())
}
