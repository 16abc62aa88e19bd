//! Test plugin that panics on purpose: during registration when its config
//! sets `panic_on_register`, and for the query `boom`.

use flare_plugin::{HookRegistry, PluginContext, SearchResult, kind};

fn register(registry: &mut HookRegistry, context: &PluginContext) {
    let config = context.config();
    if config.get("panic_on_register").and_then(|v| v.as_bool()) == Some(true) {
        panic!("{} refuses to register", context.id());
    }
    registry.on_query(|query| {
        if query == "boom" {
            panic!("query callback exploded");
        }
        Ok(Some(vec![SearchResult::new(kind::INFO, format!("misbehaving {query}"), "")]))
    });
}

flare_plugin::declare_plugin!(register);
