use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Per-plugin information handed to `register`.
#[derive(Debug, Clone)]
pub struct PluginContext {
    id: String,
    config_dir: PathBuf,
}

impl PluginContext {
    pub fn new(id: impl Into<String>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            config_dir: config_dir.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// The plugin's saved configuration, or an empty object when there is
    /// none or it cannot be read.
    pub fn config(&self) -> Value {
        let path = self.config_file();
        let Ok(content) = fs::read_to_string(&path) else {
            return Value::Object(Default::default());
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(plugin = %self.id, path = %path.display(), error = %e, "invalid plugin config");
                Value::Object(Default::default())
            }
        }
    }

    pub fn save_config(&self, config: &Value) -> bool {
        let result = fs::create_dir_all(&self.config_dir).and_then(|_| {
            let json = serde_json::to_string_pretty(config)?;
            fs::write(self.config_file(), json)
        });
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(plugin = %self.id, error = %e, "failed to save plugin config");
                false
            }
        }
    }
}
