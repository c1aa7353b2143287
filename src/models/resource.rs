use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: String,
    pub path: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub size: u64,
    pub mtime: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
    pub favorite: bool,
    pub extra_props: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub loaded: bool,
}

impl ResourceRecord {
    pub fn is_folder(&self) -> bool {
        self.resource_type == ResourceType::Folder
    }

    pub fn is_hidden(&self) -> bool {
        self.display_name.starts_with('.')
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra_props.get(key)
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key).and_then(|v| v.as_str())
    }

    pub fn etag(&self) -> Option<&str> {
        self.extra_str("etag")
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub folder: Option<ResourceRecord>,
    pub contents: Vec<ResourceRecord>,
}

#[cfg(test)]
pub(crate) fn test_record(id: &str, name: &str, resource_type: ResourceType) -> ResourceRecord {
    ResourceRecord {
        id: id.to_string(),
        path: format!("/{name}"),
        display_name: name.to_string(),
        resource_type,
        size: 0,
        mtime: None,
        mime_type: None,
        favorite: false,
        extra_props: BTreeMap::new(),
        loaded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_means_leading_dot() {
        let hidden = test_record("1", ".env", ResourceType::File);
        let visible = test_record("2", "env.", ResourceType::File);
        assert!(hidden.is_hidden());
        assert!(!visible.is_hidden());
    }

    #[test]
    fn mark_loaded_is_the_only_mutation() {
        let mut record = test_record("1", "a.txt", ResourceType::File);
        let before = record.clone();
        record.mark_loaded();
        assert!(record.loaded);
        record.loaded = false;
        assert_eq!(record, before);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut record = test_record("7", "Photos", ResourceType::Folder);
        record
            .extra_props
            .insert("etag".to_string(), serde_json::json!("abc"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["displayName"], "Photos");
        assert_eq!(json["type"], "folder");
        assert_eq!(json["extraProps"]["etag"], "abc");
        assert_eq!(record.etag(), Some("abc"));
    }
}
