//! Re-index when desktop entries are added, changed or removed.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};

use crate::indexer::Indexer;

/// Quiet period after the last event before a re-index starts.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the indexer's application directories and schedules
/// [`Indexer::index_all_async`] after each burst of changes.
///
/// Returns `None` when no watcher could be set up; the index then only
/// refreshes on explicit requests.
pub fn watch_applications(indexer: Arc<Indexer>) -> Option<JoinHandle<()>> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(error = %e, "cannot create application watcher");
            return None;
        }
    };

    let mut watched = 0;
    for dir in &indexer.config().application_dirs {
        if !dir.is_dir() {
            continue;
        }
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), "watching for changes");
                watched += 1;
            }
            Err(e) => tracing::warn!(path = %dir.display(), error = %e, "cannot watch directory"),
        }
    }
    if watched == 0 {
        return None;
    }

    let spawned = thread::Builder::new()
        .name("flare-watcher".into())
        .spawn(move || {
            let _watcher = watcher;
            // Changes seen while a pass runs wait for it to finish.
            let mut pending = false;
            loop {
                let event = if pending {
                    rx.recv_timeout(DEBOUNCE)
                } else {
                    rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                };
                match event {
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "watch error");
                        continue;
                    }
                    Ok(Ok(_)) => {
                        loop {
                            match rx.recv_timeout(DEBOUNCE) {
                                Ok(_) => continue,
                                Err(RecvTimeoutError::Timeout) => break,
                                Err(RecvTimeoutError::Disconnected) => return,
                            }
                        }
                        tracing::info!("application directories changed");
                        pending = true;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return,
                }

                if pending && !indexer.is_indexing() && indexer.index_all_async().is_some() {
                    tracing::info!("re-indexing after application change");
                    pending = false;
                }
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "cannot start watcher thread");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::IndexerConfig;
    use std::fs;
    use std::time::Instant;

    #[test]
    fn no_existing_directories_means_no_watcher() {
        let tmp = tempfile::tempdir().unwrap();
        let config = IndexerConfig {
            cache_dir: tmp.path().join("cache"),
            application_dirs: vec![tmp.path().join("missing")],
            file_roots: Vec::new(),
            max_depth: 1,
            max_files: 1,
        };
        assert!(watch_applications(Arc::new(Indexer::new(config))).is_none());
    }

    #[test]
    fn new_desktop_entry_triggers_reindex() {
        let tmp = tempfile::tempdir().unwrap();
        let apps = tmp.path().join("applications");
        fs::create_dir_all(&apps).unwrap();
        let config = IndexerConfig {
            cache_dir: tmp.path().join("cache"),
            application_dirs: vec![apps.clone()],
            file_roots: Vec::new(),
            max_depth: 1,
            max_files: 1,
        };
        let indexer = Arc::new(Indexer::new(config));
        let Some(_handle) = watch_applications(Arc::clone(&indexer)) else {
            // inotify unavailable in this environment
            return;
        };

        fs::write(apps.join("new.desktop"), "[Desktop Entry]\nName=New App\nExec=new\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while indexer.apps().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(indexer.apps().len(), 1);
    }

    #[test]
    fn change_during_running_pass_is_picked_up_afterwards() {
        let tmp = tempfile::tempdir().unwrap();
        let apps = tmp.path().join("applications");
        fs::create_dir_all(&apps).unwrap();
        let config = IndexerConfig {
            cache_dir: tmp.path().join("cache"),
            application_dirs: vec![apps.clone()],
            file_roots: Vec::new(),
            max_depth: 1,
            max_files: 1,
        };
        let indexer = Arc::new(Indexer::new(config));
        let Some(_handle) = watch_applications(Arc::clone(&indexer)) else {
            return;
        };

        indexer.set_indexing(true);
        fs::write(apps.join("late.desktop"), "[Desktop Entry]\nName=Late App\nExec=late\n").unwrap();
        thread::sleep(DEBOUNCE * 4);
        assert!(indexer.apps().is_empty());

        indexer.set_indexing(false);
        let deadline = Instant::now() + Duration::from_secs(10);
        while indexer.apps().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(indexer.apps().len(), 1);
        assert_eq!(indexer.apps()[0].name(), "Late App");
    }
}
