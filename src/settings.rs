use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_WIDTH: usize = 50;
const DEFAULT_HEIGHT: usize = 10;
const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_EXPORT_PATH: &str = "map.txt";

/// Generation and service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Columns per map.
    pub width: usize,
    /// Rows per map.
    pub height: usize,
    /// Fresh grids to try before giving up on a contradiction.
    pub max_attempts: usize,
    /// Fixed seed for the command line generator; random when absent.
    pub seed: Option<u64>,
    /// Socket address the HTTP service binds to.
    pub address: String,
    /// Destination of the text export.
    pub export_path: PathBuf,
    /// HTML template replacing the built-in page.
    pub template: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            max_attempts: 1,
            seed: None,
            address: DEFAULT_ADDRESS.to_string(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            template: None,
        }
    }
}

impl Settings {
    /// Parses YAML; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or unknown fields.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid settings")
    }

    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings '{}'", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("In '{}'", path.display()))
    }

    /// Serialises to YAML.
    ///
    /// # Errors
    ///
    /// Fails only if serialisation itself fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialise settings")
    }

    /// Rejects settings no generator can run with.
    ///
    /// # Errors
    ///
    /// Fails on a zero width, height or attempt limit.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.width > 0, "Map width must be greater than zero");
        ensure!(self.height > 0, "Map height must be greater than zero");
        ensure!(
            self.max_attempts > 0,
            "Attempt limit must be greater than zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_page() {
        let settings = Settings::default();
        assert_eq!((settings.width, settings.height), (50, 10));
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.export_path, PathBuf::from("map.txt"));
        settings.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("width: 20\nseed: 42\n").unwrap();
        assert_eq!(settings.width, 20);
        assert_eq!(settings.height, 10);
        assert_eq!(settings.seed, Some(42));
    }

    #[test]
    fn yaml_round_trip() {
        let settings = Settings {
            template: Some(PathBuf::from("page.html")),
            max_attempts: 5,
            ..Settings::default()
        };
        let yaml = settings.to_yaml().unwrap();
        assert_eq!(Settings::from_yaml(&yaml).unwrap(), settings);
    }

    #[test]
    fn rejects_unknown_fields_and_zero_sizes() {
        assert!(Settings::from_yaml("colour: red\n").is_err());
        let settings = Settings {
            height: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
