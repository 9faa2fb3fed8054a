use schemars::schema_for;
use serde::Serialize;
use shape_detect::{Detection, PipelineConfig, ShapeError};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    ShapeError(#[from] ShapeError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Loading and saving a [`PipelineConfig`] as TOML or JSON
pub trait ConfigFile: Sized {
    fn from_toml(content: &str) -> Result<Self, CliError>;
    fn from_json(content: &str) -> Result<Self, CliError>;
    fn to_toml(&self) -> Result<String, CliError>;
    fn to_json(&self) -> Result<String, CliError>;

    /// Auto-detect file format from the extension and load
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path = path.as_ref();
        match extension(path) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Write in the format the extension names
    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = match extension(path) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

impl ConfigFile for PipelineConfig {
    fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn from_json(content: &str) -> Result<Self, CliError> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// JSON schema of the config file
pub fn config_schema() -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&schema_for!(PipelineConfig))?)
}

/// What `detect --json` prints
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport<'a> {
    pub input: String,
    pub detection: &'a Detection,
}

impl<'a> DetectionReport<'a> {
    pub fn new(input: &Path, detection: &'a Detection) -> Self {
        Self {
            input: input.to_string_lossy().to_string(),
            detection,
        }
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One-line human summary of a detection
pub fn summary(detection: &Detection) -> String {
    let [x, y] = detection.centroid.point;
    let [dx, dy] = detection.centroid.offset;
    format!(
        "{} with {} vertices, centroid ({x:.1}, {y:.1}), offset from centre ({dx:+.1}, {dy:+.1})",
        detection.label,
        detection.polygon.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.lines.min_votes = 42;
        config.edges.thin_edges = true;

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join(name);
            config.to_file(&path).unwrap();
            assert_eq!(PipelineConfig::from_file(&path).unwrap(), config, "{name}");
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = PipelineConfig::from_toml("[contours]\nmin_contour_pixels = 30\n").unwrap();
        assert_eq!(config.contours.min_contour_pixels, 30);
        assert_eq!(config.edges, PipelineConfig::default().edges);
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let result = PipelineConfig::from_json(r#"{ "lines": { "min_votes": 0 } }"#);
        assert!(matches!(
            result,
            Err(CliError::ShapeError(ShapeError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "lines: {}").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(CliError::UnsupportedFileFormat)
        ));
        assert!(matches!(
            PipelineConfig::default().to_file(&path),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn schema_names_every_section() {
        let schema = config_schema().unwrap();
        for section in ["edges", "lines", "contours", "selection", "classifier"] {
            assert!(schema.contains(section), "{section}");
        }
    }
}
