//! The contract shared between the flare daemon, its search engine and
//! dynamically loaded plugins.

use serde::{Deserialize, Serialize};

mod context;
mod hooks;

pub use context::PluginContext;
pub use hooks::{Hook, HookCallback, HookEvent, HookOutput, HookRegistry, UnknownHook};

/// Well-known values for [`SearchResult::kind`]. Plugins may introduce their own.
pub mod kind {
    pub const APPLICATION: &str = "app";
    pub const FILE: &str = "file";
    pub const URL: &str = "url";
    pub const WEB: &str = "web";
    pub const CALCULATOR: &str = "calc";
    pub const INFO: &str = "info";
    pub const ACTION: &str = "action";
    pub const CLIPBOARD: &str = "clipboard";
}

/// The standardized data structure for a single result item.
///
/// Scores are only comparable within a single query evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub kind: String,
    pub name: String,
    pub subtitle: String,
    /// Command line, path, URL or literal text, depending on `kind`.
    pub action: String,
    pub icon: String,
    pub score: f64,
    /// Source file backing the result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SearchResult {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            subtitle: String::new(),
            action: action.into(),
            icon: String::new(),
            score: 0.0,
            path: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Key used for usage tracking: the source path, or the name for
    /// synthetic results.
    pub fn identity(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Name of the symbol every plugin library must export.
pub const REGISTER_SYMBOL: &[u8] = b"_flare_register";

/// Signature of the exported registration entry point. Returns `false` if
/// the plugin panicked while registering.
#[allow(improper_ctypes_definitions)]
pub type RegisterFn = unsafe extern "C" fn(registry: &mut HookRegistry, context: &PluginContext) -> bool;

/// Exports a plugin's `register` function under [`REGISTER_SYMBOL`].
///
/// Panics are caught inside the plugin; they must not unwind across the
/// `extern "C"` boundary.
///
/// ```ignore
/// fn register(registry: &mut HookRegistry, context: &PluginContext) { /* ... */ }
/// flare_plugin::declare_plugin!(register);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($register:path) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub unsafe extern "C" fn _flare_register(
            registry: &mut $crate::HookRegistry,
            context: &$crate::PluginContext,
        ) -> bool {
            ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $register(registry, context)))
                .is_ok()
        }
    };
}
