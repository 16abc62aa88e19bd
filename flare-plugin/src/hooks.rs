use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use crate::SearchResult;

/// The fixed set of extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Startup,
    Shutdown,
    Query,
    Open,
}

impl Hook {
    pub const ALL: [Hook; 4] = [Hook::Query, Hook::Open, Hook::Startup, Hook::Shutdown];

    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Startup => "on_startup",
            Hook::Shutdown => "on_shutdown",
            Hook::Query => "on_query",
            Hook::Open => "on_open",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook: {0}")]
pub struct UnknownHook(pub String);

impl FromStr for Hook {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| UnknownHook(s.to_string()))
    }
}

/// Payload handed to callbacks when a hook fires.
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    Startup,
    Shutdown,
    Query(&'a str),
    Open(&'a SearchResult),
}

impl HookEvent<'_> {
    pub fn hook(&self) -> Hook {
        match self {
            HookEvent::Startup => Hook::Startup,
            HookEvent::Shutdown => Hook::Shutdown,
            HookEvent::Query(_) => Hook::Query,
            HookEvent::Open(_) => Hook::Open,
        }
    }
}

/// What a callback hands back. Only `on_query` callbacks are expected to
/// return results; everything else returns `Ok(None)`.
pub type HookOutput = anyhow::Result<Option<Vec<SearchResult>>>;

pub type HookCallback = Box<dyn Fn(&HookEvent<'_>) -> HookOutput + Send + Sync>;

/// Callbacks subscribed to each hook, in registration order.
///
/// The registry is filled while plugins load and only read afterwards.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<Hook, Vec<HookCallback>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `callback` to the hook called `name`.
    ///
    /// Unknown names are logged and rejected; the return value tells whether
    /// the callback was accepted.
    ///
    /// A panic in `callback` is turned into an error where it happens. This
    /// function is generic, so for a plugin library the catching code is
    /// compiled into the plugin and unwinds through its own runtime only.
    pub fn register_hook<F>(&mut self, name: &str, callback: F) -> bool
    where
        F: Fn(&HookEvent<'_>) -> HookOutput + Send + Sync + 'static,
    {
        match name.parse::<Hook>() {
            Ok(hook) => {
                let guarded = move |event: &HookEvent<'_>| -> HookOutput {
                    panic::catch_unwind(AssertUnwindSafe(|| callback(event))).unwrap_or_else(|payload| {
                        Err(anyhow::anyhow!("callback panicked: {}", panic_message(payload.as_ref())))
                    })
                };
                self.hooks.entry(hook).or_default().push(Box::new(guarded));
                true
            }
            Err(e) => {
                tracing::warn!(hook = name, "{e}");
                false
            }
        }
    }

    pub fn on_query<F>(&mut self, callback: F)
    where
        F: Fn(&str) -> anyhow::Result<Option<Vec<SearchResult>>> + Send + Sync + 'static,
    {
        self.register_hook(Hook::Query.as_str(), move |event| match event {
            HookEvent::Query(query) => callback(query),
            _ => Ok(None),
        });
    }

    pub fn on_open<F>(&mut self, callback: F)
    where
        F: Fn(&SearchResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_hook(Hook::Open.as_str(), move |event| match event {
            HookEvent::Open(item) => callback(item).map(|_| None),
            _ => Ok(None),
        });
    }

    pub fn on_startup<F>(&mut self, callback: F)
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_hook(Hook::Startup.as_str(), move |_| callback().map(|_| None));
    }

    pub fn on_shutdown<F>(&mut self, callback: F)
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_hook(Hook::Shutdown.as_str(), move |_| callback().map(|_| None));
    }

    /// Appends every callback of `other`, keeping their relative order.
    pub fn extend(&mut self, other: HookRegistry) {
        for (hook, callbacks) in other.hooks {
            self.hooks.entry(hook).or_default().extend(callbacks);
        }
    }

    pub fn callback_count(&self, hook: Hook) -> usize {
        self.hooks.get(&hook).map_or(0, Vec::len)
    }

    /// Runs every callback subscribed to the event's hook.
    ///
    /// A callback that errors or panics is reported and skipped; the others
    /// still run. Non-empty result lists are collected in registration order,
    /// flattening them is up to the caller.
    pub fn trigger_hook(&self, event: &HookEvent<'_>) -> Vec<Vec<SearchResult>> {
        let hook = event.hook();
        let Some(callbacks) = self.hooks.get(&hook) else {
            return Vec::new();
        };

        let mut collected = Vec::new();
        for (index, callback) in callbacks.iter().enumerate() {
            match callback(event) {
                Ok(Some(results)) if !results.is_empty() => collected.push(results),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(%hook, callback = index, error = %e, "hook callback failed");
                }
            }
        }
        collected
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
