use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::resource::ResourceRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTag {
    pub id: u64,
    pub display_name: String,
    pub user_visible: bool,
    pub user_assignable: bool,
    pub can_assign: bool,
    pub etag: Option<String>,
    pub color: Option<String>,
}

impl SystemTag {
    /// Reads a tag out of a mapped record. Flags absent from the property bag
    /// default to the server's defaults for new tags.
    pub fn from_record(record: &ResourceRecord) -> Result<Self, AppError> {
        let id = record
            .id
            .parse::<u64>()
            .map_err(|_| AppError::Parse(format!("tag id is not numeric: {}", record.id)))?;

        Ok(Self {
            id,
            display_name: record.display_name.clone(),
            user_visible: flag(record, "userVisible")?.unwrap_or(true),
            user_assignable: flag(record, "userAssignable")?.unwrap_or(true),
            can_assign: flag(record, "canAssign")?.unwrap_or(true),
            etag: record.etag().map(str::to_string),
            color: record
                .extra_str("color")
                .filter(|c| !c.is_empty() && *c != "null")
                .map(str::to_string),
        })
    }
}

fn flag(record: &ResourceRecord, key: &str) -> Result<Option<bool>, AppError> {
    match record.extra(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
        Some(serde_json::Value::String(s)) => match s.as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(AppError::Parse(format!("{key} is not a boolean: {other}"))),
        },
        Some(other) => Err(AppError::Parse(format!("{key} is not a boolean: {other}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    pub display_name: String,
    pub user_visible: bool,
    pub user_assignable: bool,
    pub can_assign: bool,
    pub color: Option<String>,
}

impl NewTag {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            user_visible: true,
            user_assignable: true,
            can_assign: true,
            color: None,
        }
    }

    /// JSON body accepted by the tag collection; the server calls the display name `name`.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.display_name,
            "userVisible": self.user_visible,
            "userAssignable": self.user_assignable,
            "canAssign": self.can_assign,
            "color": self.color,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagObject {
    pub id: String,
    pub object_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagObjects {
    pub etag: String,
    pub objects: Vec<TagObject>,
}
