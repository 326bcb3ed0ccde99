use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked for in the working directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".lazylint.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LazyContinuationOptions {
    #[serde(default)]
    pub admonitions: bool,
}

/// `lazy-continuation-lines = false`, or a table of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Enabled(bool),
    Options(LazyContinuationOptions),
}

impl Default for RuleSetting {
    fn default() -> Self {
        RuleSetting::Enabled(true)
    }
}

impl RuleSetting {
    pub fn is_enabled(&self) -> bool {
        match self {
            RuleSetting::Enabled(enabled) => *enabled,
            RuleSetting::Options(_) => true,
        }
    }

    pub fn options(&self) -> LazyContinuationOptions {
        match self {
            RuleSetting::Enabled(_) => LazyContinuationOptions::default(),
            RuleSetting::Options(options) => *options,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Glob patterns, relative to the config file's directory.
    #[serde(default)]
    pub ignores: Vec<String>,

    #[serde(default)]
    pub lazy_continuation_lines: RuleSetting,

    /// Directory `ignores` are resolved against. Set on load.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.base_dir = config_path.parent().map(Path::to_path_buf);
        log::info!("loaded config from {}", config_path.display());

        Ok(Some(config))
    }

    /// Nearest `.lazylint.toml` in `start_dir` or an ancestor, else the user
    /// config file.
    pub fn discover<P: AsRef<Path>>(start_dir: P) -> Result<Option<Self>, ConfigError> {
        for dir in start_dir.as_ref().ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load_from_path(&candidate);
            }
        }
        Self::load_from_path(Self::user_config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn user_config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/lazylint");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Whether `path` matches one of the `ignores` patterns.
    ///
    /// Paths under `base_dir` are matched relative to it. `*` does not cross
    /// directory separators; use `**` for that.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = self
            .base_dir
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path);
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        self.ignores.iter().any(|raw| match Pattern::new(raw) {
            Ok(pattern) => pattern.matches_path_with(relative, options),
            Err(err) => {
                log::warn!("ignoring invalid pattern {raw:?}: {err}");
                false
            }
        })
    }
}
