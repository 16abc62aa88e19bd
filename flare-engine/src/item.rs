use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Application,
    File,
}

/// An application read from a desktop entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    /// Raw `Exec` line, field codes included.
    pub exec: String,
    #[serde(default)]
    pub icon: String,
    /// `None` when the entry has no `Comment` key at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Path of the desktop entry.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: f64,
    pub size: u64,
}

/// One entry of an index snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndexedItem {
    #[serde(rename = "app")]
    Application(Application),
    #[serde(rename = "file")]
    File(FileEntry),
}

impl IndexedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            IndexedItem::Application(_) => ItemKind::Application,
            IndexedItem::File(_) => ItemKind::File,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            IndexedItem::Application(app) => &app.name,
            IndexedItem::File(file) => &file.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            IndexedItem::Application(app) => &app.path,
            IndexedItem::File(file) => &file.path,
        }
    }

    /// Usage-tracking key: the source path, or the name if there is no path.
    pub fn identity(&self) -> &str {
        match self.path() {
            "" => self.name(),
            path => path,
        }
    }

    /// Case-folded name, what queries are compared against.
    pub fn sort_key(&self) -> String {
        self.name().to_lowercase()
    }
}

/// How often and how recently an item was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub count: u64,
    /// Seconds since the Unix epoch; zero if never used.
    pub last_used: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let item = IndexedItem::File(FileEntry {
            name: "report.pdf".into(),
            path: "/home/u/Documents/report.pdf".into(),
            mtime: 1_700_000_000.5,
            size: 2048,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["size"], 2048);
    }

    #[test]
    fn reads_application_without_optional_fields() {
        let json = r#"{"type":"app","name":"Firefox","exec":"firefox %u","path":"/usr/share/applications/firefox.desktop"}"#;
        let item: IndexedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind(), ItemKind::Application);
        assert_eq!(item.name(), "Firefox");
        assert_eq!(item.identity(), "/usr/share/applications/firefox.desktop");
    }

    #[test]
    fn identity_falls_back_to_name() {
        let item = IndexedItem::File(FileEntry {
            name: "orphan".into(),
            path: String::new(),
            mtime: 0.0,
            size: 0,
        });
        assert_eq!(item.identity(), "orphan");
    }
}
