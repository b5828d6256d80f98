use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use derive_more::*;
use serde::{Deserialize, Serialize};
use crate::demos::{DemoKind, GeometryKind};

/// File read when no `--config` is given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "scene_demos.yaml";

/**
 * Settings for a demo run. Every field is optional in YAML.
 */
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub window: WindowConfig,
    /// Directory texture paths are relative to.
    pub assets: PathBuf,
    /// Overrides the demo's own antialias preference.
    pub antialias: Option<bool>,
    pub demo: DemoKind,
    pub geometry: GeometryKind,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: PathBuf::from("assets"),
            antialias: None,
            demo: DemoKind::default(),
            geometry: GeometryKind::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Defaults to the demo's title.
    pub title: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: None,
        }
    }
}

impl DemoConfig {

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        log::info!("Loaded config {path:?}");
        Self::from_yaml(&yaml)
    }

    /**
     * Loads `path` when given. Otherwise loads [`DEFAULT_CONFIG_PATH`] if it exists,
     * falling back to defaults.
     */
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Error, Display, Debug)]
pub enum ConfigError {
    #[display(fmt="failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[display(fmt="invalid config: {source}")]
    Yaml { source: serde_yaml::Error },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source }
    }
}


#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};
    use crate::demos::{DemoKind, GeometryKind};
    use super::{ConfigError, DemoConfig};

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(DemoConfig::default(), DemoConfig::from_yaml("{}").unwrap());
    }

    #[test]
    fn partial_yaml() {
        let config = DemoConfig::from_yaml("
window:
  width: 1280
  title: Orbit
demo: solar-system
geometry: torus
antialias: false
").unwrap();
        assert_eq!(1280, config.window.width);
        assert_eq!(600, config.window.height);
        assert_eq!(Some("Orbit"), config.window.title.as_deref());
        assert_eq!(DemoKind::SolarSystem, config.demo);
        assert_eq!(GeometryKind::Torus, config.geometry);
        assert_eq!(Some(false), config.antialias);
        assert_eq!(PathBuf::from("assets"), config.assets);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = DemoConfig::from_yaml("demo: basic\nspeed: 2");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = DemoConfig::load_or_default(Some(Path::new("no/such/scene_demos.yaml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
