//! Extra web search prefixes on top of the engine's built-in ones.
//!
//! Install by copying `plugin.json` and the built library into
//! `$XDG_CONFIG_HOME/flare/plugins/web_shortcuts/`. Shortcuts can be replaced
//! through the plugin's `config.json`:
//!
//! ```json
//! { "shortcuts": [{ "prefix": "crates ", "name": "crates.io", "url": "https://crates.io/search?q=" }] }
//! ```

use flare_plugin::{HookRegistry, PluginContext, SearchResult, kind};
use serde::Deserialize;

const SCORE: f64 = 850.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shortcut {
    pub prefix: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Config {
    shortcuts: Option<Vec<Shortcut>>,
}

pub fn default_shortcuts() -> Vec<Shortcut> {
    [
        ("reddit ", "Reddit", "https://www.reddit.com/search/?q="),
        ("tw ", "Twitter", "https://twitter.com/search?q="),
        ("imdb ", "IMDB", "https://www.imdb.com/find?q="),
        ("maps ", "Google Maps", "https://www.google.com/maps/search/"),
        ("translate ", "Google Translate", "https://translate.google.com/?q="),
    ]
    .into_iter()
    .map(|(prefix, name, url)| Shortcut {
        prefix: prefix.into(),
        name: name.into(),
        url: url.into(),
    })
    .collect()
}

pub struct WebShortcuts {
    shortcuts: Vec<Shortcut>,
}

impl WebShortcuts {
    pub fn new(shortcuts: Vec<Shortcut>) -> Self {
        Self { shortcuts }
    }

    fn from_context(context: &PluginContext) -> Self {
        let config: Config = serde_json::from_value(context.config()).unwrap_or_else(|e| {
            tracing::warn!(plugin = context.id(), error = %e, "ignoring plugin config");
            Config::default()
        });
        Self::new(config.shortcuts.unwrap_or_else(default_shortcuts))
    }

    pub fn query(&self, query: &str) -> Option<Vec<SearchResult>> {
        let query = query.trim();
        self.shortcuts.iter().find_map(|shortcut| {
            let head = query.get(..shortcut.prefix.len())?;
            if !head.eq_ignore_ascii_case(&shortcut.prefix) {
                return None;
            }
            let term = query[shortcut.prefix.len()..].trim();
            if term.is_empty() {
                return None;
            }
            let url = format!("{}{}", shortcut.url, term.replace(' ', "+"));
            Some(vec![
                SearchResult::new(kind::WEB, format!("Search {} for '{}'", shortcut.name, term), url)
                    .with_subtitle(&shortcut.name)
                    .with_icon("web-browser")
                    .with_score(SCORE),
            ])
        })
    }
}

pub fn register(registry: &mut HookRegistry, context: &PluginContext) {
    let shortcuts = WebShortcuts::from_context(context);
    registry.on_query(move |query| Ok(shortcuts.query(query)));
}

flare_plugin::declare_plugin!(register);
