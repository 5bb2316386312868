use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::metrics::GapScheme;
use crate::snapshot::SnapshotAssembler;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    pub scheme: String,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            scheme: GapScheme::Standard.label().to_string(),
        }
    }
}

impl GapConfig {
    pub fn to_scheme(&self) -> GapScheme {
        self.scheme.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/snapshots.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gap: GapConfig,
    pub history: HistoryConfig,
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                Self::parse(&contents)?
            }
            _ => EngineConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| format!("failed to create config dir: {}", err))?;
            }
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    pub fn assembler(&self) -> SnapshotAssembler {
        SnapshotAssembler::new(self.gap.to_scheme())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(scheme) = env::var("SEARCH_SHARE_GAP_SCHEME") {
            if !scheme.trim().is_empty() {
                self.gap.scheme = scheme;
            }
        }
        if let Ok(path) = env::var("SEARCH_SHARE_HISTORY_PATH") {
            if !path.trim().is_empty() {
                self.history.path = PathBuf::from(path);
            }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    env::var("SEARCH_SHARE_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/search_share.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EngineConfig::parse("[gap]\nscheme = \"narrow\"\n").unwrap();

        assert_eq!(config.gap.to_scheme(), GapScheme::Narrow);
        assert_eq!(config.history.path, PathBuf::from("data/snapshots.json"));
    }

    #[test]
    fn unknown_scheme_falls_back_to_standard() {
        let config = EngineConfig::parse("[gap]\nscheme = \"wide\"\n").unwrap();

        assert_eq!(config.gap.to_scheme(), GapScheme::Standard);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = EngineConfig::parse("[gap\n").unwrap_err();

        assert!(err.starts_with("failed to parse config"));
    }

    #[test]
    fn written_config_parses_back() {
        let path = env::temp_dir().join(format!("search-share-config-{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.gap.scheme = "narrow".to_string();

        config.write(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let parsed = EngineConfig::parse(&contents).unwrap();
        assert_eq!(parsed.gap.scheme, "narrow");
    }
}
