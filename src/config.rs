use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/expense_tracker.toml";
const ENV_PREFIX: &str = "EXPENSE_TRACKER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartsBackend {
    Terminal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerBackend {
    Text,
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_file: PathBuf,
    pub log_level: String,
    pub currency: String,
    pub charts: ChartsBackend,
    pub scanner: ScannerBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("expenses.json"),
            log_level: "warn".to_string(),
            currency: "₹".to_string(),
            charts: ChartsBackend::Terminal,
            scanner: ScannerBackend::Text,
        }
    }
}

/// Command-line values that take precedence over the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Layers the TOML file (optional unless given explicitly), `EXPENSE_TRACKER_*`
/// variables and command-line overrides, in that order.
pub fn load(overrides: &Overrides) -> Result<Settings> {
    let (path, required) = match overrides.config.as_deref() {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };

    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(required))
        .add_source(config::Environment::with_prefix(ENV_PREFIX));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(data_file) = &overrides.data_file {
        settings.data_file = data_file.clone();
    }
    if let Some(level) = &overrides.log_level {
        settings.log_level = level.clone();
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::default();
        assert_eq!(settings.data_file, PathBuf::from("expenses.json"));
        assert_eq!(settings.charts, ChartsBackend::Terminal);
        assert_eq!(settings.scanner, ScannerBackend::Text);
    }

    #[test]
    fn test_load_file_then_cli_overrides() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "data_file = \"from_file.json\"\ncurrency = \"$\"\ncharts = \"none\"").unwrap();

        let settings = load(&Overrides {
            config: Some(file.path().to_path_buf()),
            data_file: Some(PathBuf::from("from_cli.json")),
            log_level: Some("debug".to_string()),
        })
        .unwrap();

        assert_eq!(settings.data_file, PathBuf::from("from_cli.json"));
        assert_eq!(settings.currency, "$");
        assert_eq!(settings.charts, ChartsBackend::None);
        assert_eq!(settings.scanner, ScannerBackend::Text);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_explicit_missing_config_file_is_an_error() {
        let result = load(&Overrides {
            config: Some(PathBuf::from("/no/such/config.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
