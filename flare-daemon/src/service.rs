use std::sync::Arc;

use flare_plugin::SearchResult;
use serde::{Deserialize, Serialize};
use zbus::{interface, zvariant::Type};

use crate::orchestrator::Orchestrator;

pub const BUS_NAME: &str = "org.flare.Engine";
pub const OBJECT_PATH: &str = "/org/flare/Engine1";

/// Result item as it travels over D-Bus: `(ssssssd)`. An empty `path` means
/// the result has no backing file.
#[derive(Debug, Clone, PartialEq, Type, Serialize, Deserialize)]
pub struct DbusResultItem {
    kind: String,
    name: String,
    subtitle: String,
    action: String,
    icon: String,
    path: String,
    score: f64,
}

impl From<SearchResult> for DbusResultItem {
    fn from(item: SearchResult) -> Self {
        Self {
            kind: item.kind,
            name: item.name,
            subtitle: item.subtitle,
            action: item.action,
            icon: item.icon,
            path: item.path.unwrap_or_default(),
            score: item.score,
        }
    }
}

impl From<DbusResultItem> for SearchResult {
    fn from(item: DbusResultItem) -> Self {
        Self {
            kind: item.kind,
            name: item.name,
            subtitle: item.subtitle,
            action: item.action,
            icon: item.icon,
            path: (!item.path.is_empty()).then_some(item.path),
            score: item.score,
        }
    }
}

pub struct Engine {
    orchestrator: Arc<Orchestrator>,
}

impl Engine {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[interface(name = "org.flare.Engine1")]
impl Engine {
    async fn search(&self, query: &str) -> Vec<DbusResultItem> {
        self.orchestrator
            .handle_query(query)
            .into_iter()
            .map(DbusResultItem::from)
            .collect()
    }

    async fn open(&self, item: DbusResultItem) -> bool {
        self.orchestrator.handle_select(&item.into())
    }

    async fn reindex(&self) -> bool {
        self.orchestrator.reindex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_plugin::kind;

    #[test]
    fn converts_both_ways() {
        let with_path = SearchResult::new(kind::FILE, "a.txt", "/a.txt")
            .with_subtitle("Text File")
            .with_score(42.5)
            .with_path("/a.txt");
        let wire = DbusResultItem::from(with_path.clone());
        assert_eq!(wire.path, "/a.txt");
        assert_eq!(SearchResult::from(wire), with_path);

        let synthetic = SearchResult::new(kind::WEB, "Search", "https://example.org");
        let back = SearchResult::from(DbusResultItem::from(synthetic.clone()));
        assert_eq!(back.path, None);
        assert_eq!(back, synthetic);
    }

    #[test]
    fn wire_signature() {
        assert_eq!(DbusResultItem::signature().as_str(), "(ssssssd)");
    }
}
