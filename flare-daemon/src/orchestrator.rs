use flare_engine::SearchEngine;
use flare_plugin::{HookEvent, SearchResult};

use crate::executor::Executor;
use crate::plugins::PluginManager;

/// Glues plugins, the search engine and the executor together for the
/// presentation layer.
pub struct Orchestrator {
    engine: SearchEngine,
    plugins: PluginManager,
    executor: Box<dyn Executor>,
}

impl Orchestrator {
    pub fn new(engine: SearchEngine, plugins: PluginManager, executor: Box<dyn Executor>) -> Self {
        Self {
            engine,
            plugins,
            executor,
        }
    }

    /// Engine results followed by plugin contributions, in plugin order.
    pub fn handle_query(&self, query: &str) -> Vec<SearchResult> {
        let plugin_results = self.plugins.trigger_hook(&HookEvent::Query(query));
        let mut results = self.engine.search(query);
        results.extend(plugin_results.into_iter().flatten());
        results
    }

    /// Notifies plugins, runs the item and counts the use if it succeeded.
    pub fn handle_select(&self, item: &SearchResult) -> bool {
        self.plugins.trigger_hook(&HookEvent::Open(item));
        let success = self.executor.execute(item);
        if success {
            self.engine.indexer().record_usage(item.identity());
        } else {
            tracing::info!(name = %item.name, kind = %item.kind, "could not open item");
        }
        success
    }

    /// Starts a background re-index. `false` if one is already running.
    pub fn reindex(&self) -> bool {
        self.engine.indexer().index_all_async().is_some()
    }

    pub fn startup(&self) {
        self.plugins.trigger_hook(&HookEvent::Startup);
    }

    pub fn shutdown(&self) {
        self.plugins.trigger_hook(&HookEvent::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_engine::cache::{CacheStore, Collection};
    use flare_engine::{Application, IndexedItem, Indexer, IndexerConfig};
    use flare_plugin::kind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct FakeExecutor {
        succeed: bool,
        executed: Arc<Mutex<Vec<String>>>,
    }

    impl Executor for FakeExecutor {
        fn execute(&self, item: &SearchResult) -> bool {
            self.executed.lock().unwrap().push(item.action.clone());
            self.succeed
        }
    }

    fn orchestrator(executor: FakeExecutor, plugins: PluginManager) -> (TempDir, Orchestrator) {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(tmp.path());
        let apps = vec![IndexedItem::Application(Application {
            name: "Firefox".into(),
            exec: "firefox %u".into(),
            icon: "firefox".into(),
            comment: Some("Browse the web".into()),
            categories: Vec::new(),
            keywords: Vec::new(),
            path: "/usr/share/applications/firefox.desktop".into(),
        })];
        store.save(Collection::Applications, &apps).unwrap();

        let config = IndexerConfig {
            cache_dir: tmp.path().to_path_buf(),
            application_dirs: Vec::new(),
            file_roots: Vec::new(),
            max_depth: 4,
            max_files: 100,
        };
        let engine = SearchEngine::new(Arc::new(Indexer::new(config)));
        (tmp, Orchestrator::new(engine, plugins, Box::new(executor)))
    }

    fn no_plugins() -> PluginManager {
        PluginManager::new("/nonexistent/flare/plugins")
    }

    #[test]
    fn appends_plugin_results_after_engine_results() {
        let mut plugins = no_plugins();
        plugins
            .registry_mut()
            .on_query(|q| Ok(Some(vec![SearchResult::new(kind::INFO, format!("plugin saw {q}"), "")])));
        plugins.registry_mut().on_query(|_| anyhow::bail!("broken plugin"));

        let (_tmp, orchestrator) = orchestrator(FakeExecutor::default(), plugins);
        let results = orchestrator.handle_query("firefox");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Firefox");
        assert_eq!(results[1].name, "plugin saw firefox");
    }

    #[test]
    fn successful_open_records_usage() {
        let opened = Arc::new(AtomicUsize::new(0));
        let mut plugins = no_plugins();
        let counter = Arc::clone(&opened);
        plugins.registry_mut().on_open(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let executor = FakeExecutor {
            succeed: true,
            ..Default::default()
        };
        let (_tmp, orchestrator) = orchestrator(executor.clone(), plugins);
        let item = orchestrator.handle_query("firefox").remove(0);

        assert!(orchestrator.handle_select(&item));
        assert!(orchestrator.handle_select(&item));

        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(*executor.executed.lock().unwrap(), vec!["firefox %u", "firefox %u"]);
        let usage = orchestrator
            .engine
            .indexer()
            .get_usage("/usr/share/applications/firefox.desktop");
        assert_eq!(usage.count, 2);
    }

    #[test]
    fn failed_open_records_nothing() {
        let (_tmp, orchestrator) = orchestrator(FakeExecutor::default(), no_plugins());
        let item = SearchResult::new(kind::URL, "https://github.com", "https://github.com");

        assert!(!orchestrator.handle_select(&item));
        assert_eq!(orchestrator.engine.indexer().get_usage("https://github.com").count, 0);
    }

    #[test]
    fn synthetic_results_are_tracked_by_name() {
        let executor = FakeExecutor {
            succeed: true,
            ..Default::default()
        };
        let (_tmp, orchestrator) = orchestrator(executor, no_plugins());
        let item = orchestrator.handle_query("github.com").remove(0);

        assert!(orchestrator.handle_select(&item));
        assert_eq!(orchestrator.engine.indexer().get_usage("https://github.com").count, 1);
    }
}
