//! `phycalc.toml` project configuration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use phycalc_model::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "phycalc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub part: PartConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Optional inputs applied to every PHY whose profile declares them.
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartConfig {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    /// Build target name or tag.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// `json`, `toml` or `text`.
    #[serde(default)]
    pub format: Option<String>,
    /// Directory `sweep` writes exports into.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_show_do_not_care")]
    pub show_do_not_care: bool,
}

fn default_show_do_not_care() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            dir: None,
            show_do_not_care: default_show_do_not_care(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

impl ProjectConfig {
    /// Search upward from `start_dir` for `phycalc.toml`, returning the
    /// parsed file and the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>, ConfigError> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Contents written by `phycalc init`.
    pub fn template(family: &str, revision: &str) -> String {
        format!(
            r#"[part]
family = "{family}"
revision = "{revision}"
# target = "IC"

[output]
format = "text"
dir = "out"
show-do-not-care = true

[log]
filter = "warn"

# Optional profile inputs applied to every PHY that declares them.
[inputs]
"#
        )
    }
}
