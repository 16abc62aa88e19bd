//! Indexing and ranking for the flare launcher.
//!
//! The [`Indexer`] crawls application descriptors and user files into
//! snapshots persisted by the [`CacheStore`]; the [`SearchEngine`] ranks those
//! snapshots against a query together with the calculator, URL and web
//! shortcut detectors.

pub mod cache;
pub mod calc;
pub mod desktop;
pub mod detect;
pub mod error;
pub mod filetype;
pub mod fuzzy;
pub mod indexer;
pub mod item;
pub mod search;
pub mod walker;
pub mod watch;

pub use cache::{CacheStore, Collection};
pub use error::{Error, Result};
pub use indexer::{Indexer, IndexerConfig};
pub use item::{Application, FileEntry, IndexedItem, ItemKind, UsageRecord};
pub use search::{SearchEngine, Weights};
