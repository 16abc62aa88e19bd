use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flare_plugin::{HookEvent, HookRegistry, PluginContext, REGISTER_SYMBOL, RegisterFn, SearchResult};
use libloading::{Library, Symbol};
use serde::Deserialize;

/// Contents of a plugin's `plugin.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginMetadata {
    pub id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Library file inside the plugin directory. Defaults to the first shared
    /// library found there.
    pub library: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
}

pub struct PluginManager {
    // Dropped before `_libraries`: the callbacks' code lives in them.
    registry: HookRegistry,
    plugins: Vec<LoadedPlugin>,
    plugins_dir: PathBuf,
    _libraries: Vec<Library>,
}

impl PluginManager {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: HookRegistry::new(),
            plugins: Vec::new(),
            plugins_dir: plugins_dir.into(),
            _libraries: Vec::new(),
        }
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// For hooks compiled into the daemon itself.
    pub fn registry_mut(&mut self) -> &mut HookRegistry {
        &mut self.registry
    }

    pub fn trigger_hook(&self, event: &HookEvent<'_>) -> Vec<Vec<SearchResult>> {
        self.registry.trigger_hook(event)
    }

    /// Loads every plugin directory below the plugins directory.
    ///
    /// # Safety
    ///
    /// Runs the initialization code of every enabled plugin library, which
    /// must have been built against the same `flare-plugin` as the daemon.
    pub unsafe fn load_all_plugins(&mut self) {
        tracing::info!(path = %self.plugins_dir.display(), "loading plugins");
        let entries = match fs::read_dir(&self.plugins_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.plugins_dir.display(), error = %e, "plugin directory unavailable");
                return;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            match unsafe { self.load_plugin(&dir) } {
                Ok(Some(plugin)) => {
                    tracing::info!(
                        id = %plugin.id,
                        name = %plugin.name,
                        version = %plugin.version,
                        description = %plugin.description,
                        "loaded plugin"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = ?e, "error loading plugin");
                }
            }
        }
    }

    /// Loads one plugin directory. `Ok(None)` when the plugin is disabled or
    /// lacks its metadata or library.
    ///
    /// # Safety
    ///
    /// See [`PluginManager::load_all_plugins`].
    pub unsafe fn load_plugin(&mut self, dir: &Path) -> Result<Option<&LoadedPlugin>> {
        let metadata_file = dir.join("plugin.json");
        if !metadata_file.is_file() {
            return Ok(None);
        }
        let metadata: PluginMetadata = serde_json::from_str(
            &fs::read_to_string(&metadata_file)
                .with_context(|| format!("Failed to read {:?}", metadata_file))?,
        )
        .with_context(|| format!("Invalid plugin metadata at: {:?}", metadata_file))?;

        let id = metadata.id.clone().unwrap_or_else(|| {
            dir.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        if !metadata.enabled {
            tracing::info!(id = %id, "plugin is disabled, skipping");
            return Ok(None);
        }
        let Some(library_path) = find_library(dir, &metadata) else {
            tracing::debug!(id = %id, "plugin has no library, skipping");
            return Ok(None);
        };

        tracing::debug!(id = %id, path = %library_path.display(), "attempting to load library");
        let library = unsafe { Library::new(&library_path) }
            .with_context(|| format!("Failed to load library at: {:?}", library_path))?;

        // Register into a scratch registry so a plugin that fails halfway
        // leaves nothing behind.
        let mut scratch = HookRegistry::new();
        {
            let register: Symbol<RegisterFn> = unsafe { library.get(REGISTER_SYMBOL) }
                .with_context(|| format!("{:?} does not export _flare_register", library_path))?;
            let context = PluginContext::new(&id, self.plugins_dir.join(&id));
            if !unsafe { register(&mut scratch, &context) } {
                bail!("plugin {id} panicked during registration");
            }
        }

        self.registry.extend(scratch);
        self._libraries.push(library);
        self.plugins.push(LoadedPlugin {
            name: metadata.name.clone().unwrap_or_else(|| id.clone()),
            id,
            version: metadata.version,
            description: metadata.description,
        });
        Ok(self.plugins.last())
    }
}

fn find_library(dir: &Path, metadata: &PluginMetadata) -> Option<PathBuf> {
    if let Some(name) = &metadata.library {
        let path = dir.join(name);
        return path.is_file().then_some(path);
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_plugin::Hook;

    fn plugin_dir(root: &Path, name: &str, metadata: Option<&str>, library: Option<&str>) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(metadata) = metadata {
            fs::write(dir.join("plugin.json"), metadata).unwrap();
        }
        if let Some(library) = library {
            fs::write(dir.join(library), b"not really a shared object").unwrap();
        }
        dir
    }

    #[test]
    fn skips_incomplete_and_disabled_plugins() {
        let tmp = tempfile::tempdir().unwrap();
        let no_metadata = plugin_dir(tmp.path(), "no-metadata", None, Some("libx.so"));
        let no_library = plugin_dir(tmp.path(), "no-library", Some(r#"{"id":"a","enabled":true}"#), None);
        let disabled = plugin_dir(tmp.path(), "disabled", Some(r#"{"id":"b","enabled":false}"#), Some("libb.so"));
        let implicit = plugin_dir(tmp.path(), "implicit", Some(r#"{"id":"c"}"#), Some("libc.so"));

        let mut manager = PluginManager::new(tmp.path());
        for dir in [no_metadata, no_library, disabled, implicit] {
            assert!(unsafe { manager.load_plugin(&dir) }.unwrap().is_none());
        }
        assert!(manager.plugins().is_empty());
    }

    #[test]
    fn invalid_library_is_an_error_and_not_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let file = format!("libbroken.{}", std::env::consts::DLL_EXTENSION);
        let dir = plugin_dir(tmp.path(), "broken", Some(r#"{"enabled":true}"#), Some(&file));

        let mut manager = PluginManager::new(tmp.path());
        assert!(unsafe { manager.load_plugin(&dir) }.is_err());
        assert!(manager.plugins().is_empty());

        unsafe { manager.load_all_plugins() };
        assert!(manager.plugins().is_empty());
    }

    #[test]
    fn missing_plugins_dir_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manager = PluginManager::new(tmp.path().join("absent"));
        unsafe { manager.load_all_plugins() };
        assert!(manager.plugins().is_empty());
    }

    #[test]
    fn metadata_defaults() {
        let metadata: PluginMetadata = serde_json::from_str(r#"{"name":"Clock"}"#).unwrap();
        assert!(!metadata.enabled);
        assert_eq!(metadata.version, "1.0.0");
        assert!(metadata.id.is_none());
    }

    #[test]
    fn library_named_in_metadata_is_preferred() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = plugin_dir(tmp.path(), "named", None, Some("b.so"));
        fs::write(dir.join("a.so"), b"").unwrap();

        let named: PluginMetadata = serde_json::from_str(r#"{"library":"b.so"}"#).unwrap();
        assert_eq!(find_library(&dir, &named), Some(dir.join("b.so")));

        let missing: PluginMetadata = serde_json::from_str(r#"{"library":"c.so"}"#).unwrap();
        assert_eq!(find_library(&dir, &missing), None);
    }

    /// Builds the fixture plugin library and returns its path.
    fn build_misbehaving_plugin() -> PathBuf {
        use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
        use std::process::Command;

        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/misbehaving-plugin/Cargo.toml");
        // target/<profile>/deps/<test binary>
        let target_dir = std::env::current_exe()
            .unwrap()
            .ancestors()
            .nth(3)
            .unwrap()
            .join("plugin-fixtures");
        let status = Command::new(env!("CARGO"))
            .args(["build", "--quiet", "--manifest-path"])
            .arg(&manifest)
            .arg("--target-dir")
            .arg(&target_dir)
            .status()
            .unwrap();
        assert!(status.success(), "building the fixture plugin failed");
        target_dir
            .join("debug")
            .join(format!("{DLL_PREFIX}flare_plugin_misbehaving{DLL_SUFFIX}"))
    }

    fn install(plugins_dir: &Path, name: &str, id: &str, library: &Path) {
        let dir = plugins_dir.join(name);
        fs::create_dir_all(&dir).unwrap();
        let file = format!("plugin.{}", std::env::consts::DLL_EXTENSION);
        fs::copy(library, dir.join(&file)).unwrap();
        fs::write(
            dir.join("plugin.json"),
            format!(r#"{{"id":"{id}","enabled":true,"library":"{file}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn panicking_plugin_library_is_contained() {
        let library = build_misbehaving_plugin();
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path(), "a", "panics-on-register", &library);
        install(tmp.path(), "b", "panics-on-query", &library);
        fs::create_dir_all(tmp.path().join("panics-on-register")).unwrap();
        fs::write(
            tmp.path().join("panics-on-register/config.json"),
            r#"{"panic_on_register": true}"#,
        )
        .unwrap();

        let mut manager = PluginManager::new(tmp.path());
        manager
            .registry_mut()
            .on_query(|q| Ok(Some(vec![SearchResult::new("info", format!("host {q}"), "")])));
        unsafe { manager.load_all_plugins() };

        let ids: Vec<_> = manager.plugins().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["panics-on-query"]);
        assert_eq!(manager.registry_mut().callback_count(Hook::Query), 2);

        let results = manager.trigger_hook(&HookEvent::Query("boom"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][0].name, "host boom");

        let results = manager.trigger_hook(&HookEvent::Query("hi"));
        let names: Vec<_> = results.iter().flatten().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["host hi", "misbehaving hi"]);
    }

    #[test]
    fn builtin_hooks_go_through_the_manager() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manager = PluginManager::new(tmp.path());
        manager
            .registry_mut()
            .on_query(|q| Ok(Some(vec![SearchResult::new("info", format!("echo {q}"), "")])));

        let results = manager.trigger_hook(&HookEvent::Query("hi"));
        assert_eq!(results[0][0].name, "echo hi");
        assert_eq!(manager.registry_mut().callback_count(Hook::Query), 1);
    }
}
