use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flare_engine::IndexerConfig;
use flare_engine::search::DEFAULT_MAX_RESULTS;
use serde::Deserialize;

/// Daemon settings, read from `$XDG_CONFIG_HOME/flare/config.toml`.
/// Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub plugin_dir: Option<PathBuf>,
    pub max_results: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_files: Option<usize>,
    pub application_dirs: Option<Vec<PathBuf>>,
    pub file_roots: Option<Vec<PathBuf>>,
    pub watch_applications: Option<bool>,
}

fn config_home() -> PathBuf {
    match xdg::BaseDirectories::with_prefix("flare") {
        Ok(xdg_dirs) => xdg_dirs.get_config_home(),
        Err(_) => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("flare"),
    }
}

pub fn default_config_path() -> PathBuf {
    config_home().join("config.toml")
}

/// Expands a leading `~/`.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl Config {
    /// Reads the config file. A missing default file means defaults; a file
    /// passed explicitly must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path();
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file at: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid config file at: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.plugin_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| config_home().join("plugins"))
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    pub fn watch_applications(&self) -> bool {
        self.watch_applications.unwrap_or(true)
    }

    pub fn indexer_config(&self) -> IndexerConfig {
        let mut config = match &self.cache_dir {
            Some(dir) => IndexerConfig::new(expand_home(dir)),
            None => IndexerConfig::default(),
        };
        if let Some(dirs) = &self.application_dirs {
            config.application_dirs = dirs.iter().map(|d| expand_home(d)).collect();
        }
        if let Some(roots) = &self.file_roots {
            config.file_roots = roots.iter().map(|r| expand_home(r)).collect();
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(max_files) = self.max_files {
            config.max_files = max_files;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.max_results(), 12);
        assert!(config.watch_applications());

        let indexer = config.indexer_config();
        assert_eq!(indexer.max_depth, 4);
        assert_eq!(indexer.max_files, 20_000);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::parse(
            r#"
            cache_dir = "/tmp/flare-cache"
            plugin_dir = "/opt/flare/plugins"
            max_results = 5
            max_depth = 2
            max_files = 10
            application_dirs = ["/usr/share/applications"]
            file_roots = ["/srv/docs", "/srv/media"]
            watch_applications = false
            "#,
        )
        .unwrap();

        assert_eq!(config.max_results(), 5);
        assert!(!config.watch_applications());
        assert_eq!(config.plugin_dir(), PathBuf::from("/opt/flare/plugins"));

        let indexer = config.indexer_config();
        assert_eq!(indexer.cache_dir, PathBuf::from("/tmp/flare-cache"));
        assert_eq!(indexer.application_dirs, vec![PathBuf::from("/usr/share/applications")]);
        assert_eq!(indexer.file_roots.len(), 2);
        assert_eq!(indexer.max_depth, 2);
        assert_eq!(indexer.max_files, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("max_result = 3").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Notes")), home.join("Notes"));
        }
        assert_eq!(expand_home(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
