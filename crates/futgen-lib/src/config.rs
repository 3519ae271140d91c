//! Tool configuration: TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::generator::GenType;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str = "# futgen configuration. Paths are relative to the working directory.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Channel-map breadth for synthesized WM sweeps: "optimized" or "extended".
    #[serde(default = "default_gen_type")]
    pub gen_type: String,

    /// Regulatory rule table (JSON).
    #[serde(default = "default_regulatory_file")]
    pub regulatory_file: String,

    /// Directory holding `<MODEL>.json` capability documents.
    #[serde(default = "default_capabilities_dir")]
    pub capabilities_dir: String,

    /// Root of the template layers (`generic/`, `platform/<vendor>/`, `model/<MODEL>/`).
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    /// Where generated and comparison artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_gen_type() -> String {
    GenType::Optimized.as_str().into()
}
fn default_regulatory_file() -> String {
    "config/regulatory.json".into()
}
fn default_capabilities_dir() -> String {
    "config/model".into()
}
fn default_template_dir() -> String {
    "config/templates".into()
}
fn default_output_dir() -> String {
    ".".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gen_type: default_gen_type(),
            regulatory_file: default_regulatory_file(),
            capabilities_dir: default_capabilities_dir(),
            template_dir: default_template_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `gen_type` is neither "optimized" nor "extended".
    InvalidGenType(String),
    /// A path field is empty or whitespace-only.
    EmptyPath { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidGenType(t) => {
                write!(f, "Invalid gen_type \"{t}\" (expected \"optimized\" or \"extended\")")
            }
            ValidationError::EmptyPath { field } => write!(f, "{field} cannot be empty"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("futgen"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Write this config to `path` with a header comment.
    ///
    /// The contents land in a sibling `.toml.tmp` first and are renamed into
    /// place, so a reader never sees a half-written file.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let body = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{body}");
        let staged = path.with_extension("toml.tmp");
        std::fs::write(&staged, &contents)?;
        if std::fs::rename(&staged, path).is_err() {
            // Cross-device rename: write in place instead.
            let written = std::fs::write(path, &contents);
            let _ = std::fs::remove_file(&staged);
            return written;
        }
        Ok(())
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Parse `gen_type`. Unknown values fall back to optimized.
    pub fn parse_gen_type(&self) -> GenType {
        GenType::parse(&self.gen_type).unwrap_or_default()
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if GenType::parse(&self.gen_type).is_none() {
            errors.push(ValidationError::InvalidGenType(self.gen_type.clone()));
        }

        for (field, value) in [
            ("regulatory_file", &self.regulatory_file),
            ("capabilities_dir", &self.capabilities_dir),
            ("template_dir", &self.template_dir),
            ("output_dir", &self.output_dir),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::EmptyPath { field });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let c = Config::default();
        assert_eq!(c.gen_type, "optimized");
        assert_eq!(c.parse_gen_type(), GenType::Optimized);
        assert_eq!(c.output_dir, ".");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("gen_type = \"extended\"\n").unwrap();
        assert_eq!(c.parse_gen_type(), GenType::Extended);
        assert_eq!(c.regulatory_file, "config/regulatory.json");
    }

    #[test]
    fn unknown_gen_type_falls_back_to_optimized() {
        let c = Config {
            gen_type: "exhaustive".into(),
            ..Config::default()
        };
        assert_eq!(c.parse_gen_type(), GenType::Optimized);
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            gen_type: "full".into(),
            template_dir: "  ".into(),
            output_dir: String::new(),
            ..Config::default()
        };
        let errors = c.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidGenType("full".into()),
                ValidationError::EmptyPath {
                    field: "template_dir"
                },
                ValidationError::EmptyPath {
                    field: "output_dir"
                },
            ]
        );
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::EmptyPath {
                field: "regulatory_file"
            }
            .to_string(),
            "regulatory_file cannot be empty"
        );
        assert!(
            ValidationError::InvalidGenType("x".into())
                .to_string()
                .contains("\"x\"")
        );
    }

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let c = Config {
            gen_type: "extended".into(),
            capabilities_dir: "/srv/caps".into(),
            ..Config::default()
        };
        c.save_to(&path).unwrap();
        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, c);
    }

    #[test]
    fn save_to_writes_header_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# futgen configuration"));
        assert!(contents.contains("template_dir = \"config/templates\""));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(c, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gen_type = [").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
    }
}
