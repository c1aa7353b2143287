//! Declared mapping from server property names to typed record fields.
//!
//! When several properties feed the same field, the earlier table row wins.
//! Properties absent from the table are kept in `extra_props` under a
//! camelCase key derived from their local name.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::dav::multistatus::{DavEntry, DAV_NS, OC_NS};
use crate::error::AppError;
use crate::models::resource::{ResourceRecord, ResourceType};
use crate::scope_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Id,
    DisplayName,
    Size,
    Mtime,
    MimeType,
    ResourceType,
    Favorite,
    Etag,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyMapping {
    pub namespace: &'static str,
    pub local: &'static str,
    pub field: RecordField,
}

const fn map(namespace: &'static str, local: &'static str, field: RecordField) -> PropertyMapping {
    PropertyMapping {
        namespace,
        local,
        field,
    }
}

pub const PROPERTY_TABLE: &[PropertyMapping] = &[
    map(OC_NS, "fileid", RecordField::Id),
    map(OC_NS, "id", RecordField::Id),
    map(DAV_NS, "displayname", RecordField::DisplayName),
    map(OC_NS, "display-name", RecordField::DisplayName),
    map(DAV_NS, "getcontentlength", RecordField::Size),
    map(OC_NS, "size", RecordField::Size),
    map(DAV_NS, "getlastmodified", RecordField::Mtime),
    map(OC_NS, "creationDateTime", RecordField::Mtime),
    map(DAV_NS, "getcontenttype", RecordField::MimeType),
    map(DAV_NS, "resourcetype", RecordField::ResourceType),
    map(OC_NS, "favorite", RecordField::Favorite),
    map(DAV_NS, "getetag", RecordField::Etag),
];

fn is_mapped(namespace: &str, local: &str) -> bool {
    PROPERTY_TABLE
        .iter()
        .any(|m| m.namespace == namespace && m.local == local)
}

/// First non-null value feeding `field`, in table order.
fn lookup(entry: &DavEntry, field: RecordField) -> Option<&Value> {
    PROPERTY_TABLE
        .iter()
        .filter(|m| m.field == field)
        .find_map(|m| entry.prop(m.namespace, m.local).filter(|v| !v.is_null()))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `share-types` -> `shareTypes`, `actorId` stays as is.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let parts = name
        .split(['-', '_', ' ', '.'])
        .filter(|part| !part.is_empty());
    for (i, part) in parts.enumerate() {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

fn parse_mtime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Maps one multistatus entry onto a record located at `path`.
pub fn record_from_entry(entry: &DavEntry, path: String) -> Result<ResourceRecord, AppError> {
    let id = lookup(entry, RecordField::Id)
        .and_then(scalar)
        .ok_or_else(|| AppError::Parse(format!("entry {} has no id", entry.href)))?;

    let display_name = lookup(entry, RecordField::DisplayName)
        .and_then(scalar)
        .unwrap_or_else(|| scope_path::basename(&path));

    let size = match lookup(entry, RecordField::Size).and_then(scalar) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::Parse(format!("invalid size for {}: {raw}", entry.href)))?,
        None => 0,
    };

    let mtime = match lookup(entry, RecordField::Mtime).and_then(scalar) {
        Some(raw) => Some(
            parse_mtime(raw.trim())
                .ok_or_else(|| AppError::Parse(format!("invalid date for {}: {raw}", entry.href)))?,
        ),
        None => None,
    };

    let resource_type = match lookup(entry, RecordField::ResourceType) {
        Some(Value::Object(kinds)) if kinds.contains_key("collection") => ResourceType::Folder,
        _ => ResourceType::File,
    };

    let favorite = matches!(
        lookup(entry, RecordField::Favorite).and_then(scalar).as_deref(),
        Some("1") | Some("true")
    );

    let mut extra_props: BTreeMap<String, Value> = entry
        .props
        .iter()
        .filter(|p| !is_mapped(&p.name.namespace, &p.name.local))
        .map(|p| (camel_case(&p.name.local), p.value.clone()))
        .collect();
    if let Some(etag) = lookup(entry, RecordField::Etag).and_then(scalar) {
        extra_props.insert(
            "etag".to_string(),
            Value::String(etag.trim_matches('"').to_string()),
        );
    }

    Ok(ResourceRecord {
        id,
        path,
        display_name,
        resource_type,
        size,
        mtime,
        mime_type: lookup(entry, RecordField::MimeType).and_then(scalar),
        favorite,
        extra_props,
        loaded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dav::multistatus::{DavProp, PropName, NC_NS};
    use chrono::TimeZone;
    use serde_json::json;

    fn entry(props: &[(&str, &str, Value)]) -> DavEntry {
        DavEntry {
            href: "/remote.php/dav/files/alice/doc.txt".to_string(),
            props: props
                .iter()
                .map(|(ns, local, value)| DavProp {
                    name: PropName::new(ns, local),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn camel_case_converts_separators() {
        assert_eq!(camel_case("share-types"), "shareTypes");
        assert_eq!(camel_case("owner-display-name"), "ownerDisplayName");
        assert_eq!(camel_case("has_preview"), "hasPreview");
        assert_eq!(camel_case("actorId"), "actorId");
        assert_eq!(camel_case("Color"), "color");
    }

    #[test]
    fn maps_file_properties() {
        let e = entry(&[
            (OC_NS, "fileid", json!("77")),
            (DAV_NS, "getcontentlength", json!("1024")),
            (DAV_NS, "getlastmodified", json!("Tue, 05 Mar 2024 10:00:00 GMT")),
            (DAV_NS, "getcontenttype", json!("text/plain")),
            (DAV_NS, "resourcetype", Value::Null),
            (DAV_NS, "getetag", json!("\"abc123\"")),
            (OC_NS, "favorite", json!("1")),
            (OC_NS, "share-types", json!({"share-type": "0"})),
            (NC_NS, "has-preview", json!("true")),
        ]);
        let record = record_from_entry(&e, "/doc.txt".to_string()).unwrap();
        assert_eq!(record.id, "77");
        assert_eq!(record.display_name, "doc.txt");
        assert_eq!(record.resource_type, ResourceType::File);
        assert_eq!(record.size, 1024);
        assert_eq!(
            record.mtime,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(record.mime_type.as_deref(), Some("text/plain"));
        assert!(record.favorite);
        assert_eq!(record.etag(), Some("abc123"));
        assert_eq!(record.extra("shareTypes"), Some(&json!({"share-type": "0"})));
        assert_eq!(record.extra_str("hasPreview"), Some("true"));
        assert!(record.extra("fileid").is_none());
    }

    #[test]
    fn earlier_table_rows_win() {
        let e = entry(&[
            (OC_NS, "size", json!("500")),
            (DAV_NS, "getcontentlength", json!("10")),
            (OC_NS, "id", json!("2")),
            (OC_NS, "fileid", json!("1")),
        ]);
        let record = record_from_entry(&e, "/x".to_string()).unwrap();
        assert_eq!(record.size, 10);
        assert_eq!(record.id, "1");
    }

    #[test]
    fn empty_values_fall_through_to_next_row() {
        let e = entry(&[
            (OC_NS, "fileid", json!("5")),
            (DAV_NS, "getcontentlength", Value::Null),
            (OC_NS, "size", json!("4096")),
            (DAV_NS, "resourcetype", json!({"collection": null})),
        ]);
        let record = record_from_entry(&e, "/Photos".to_string()).unwrap();
        assert_eq!(record.size, 4096);
        assert!(record.is_folder());
        assert_eq!(record.display_name, "Photos");
    }

    #[test]
    fn comment_entries_use_creation_date() {
        let e = entry(&[
            (OC_NS, "id", json!("9")),
            (OC_NS, "message", json!("hello")),
            (OC_NS, "actorId", json!("bob")),
            (OC_NS, "creationDateTime", json!("2024-03-05T10:00:00+00:00")),
        ]);
        let record = record_from_entry(&e, "/comments/files/12/9".to_string()).unwrap();
        assert_eq!(record.id, "9");
        assert_eq!(record.extra_str("message"), Some("hello"));
        assert_eq!(record.extra_str("actorId"), Some("bob"));
        assert!(record.mtime.is_some());
    }

    #[test]
    fn missing_id_and_bad_values_are_parse_errors() {
        let e = entry(&[(DAV_NS, "displayname", json!("x"))]);
        assert!(matches!(
            record_from_entry(&e, "/x".to_string()),
            Err(AppError::Parse(_))
        ));

        let e = entry(&[
            (OC_NS, "fileid", json!("1")),
            (DAV_NS, "getcontentlength", json!("lots")),
        ]);
        assert!(matches!(
            record_from_entry(&e, "/x".to_string()),
            Err(AppError::Parse(_))
        ));

        let e = entry(&[
            (OC_NS, "fileid", json!("1")),
            (DAV_NS, "getlastmodified", json!("yesterday")),
        ]);
        assert!(matches!(
            record_from_entry(&e, "/x".to_string()),
            Err(AppError::Parse(_))
        ));
    }
}
