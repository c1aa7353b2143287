//! Request bodies for the DAV verbs the client issues.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::models::pagination::PaginationCursor;
use crate::models::tag::{SystemTag, TagObject};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const NAMESPACES: &str =
    r#"xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns""#;

pub const RECENT_WINDOW_DAYS: i64 = 14;
pub const RECENT_LIMIT: u32 = 100;

/// Properties requested for files and folders.
pub const FILE_PROPS: &[&str] = &[
    "d:getcontentlength",
    "d:getcontenttype",
    "d:getetag",
    "d:getlastmodified",
    "d:resourcetype",
    "d:displayname",
    "oc:fileid",
    "oc:favorite",
    "oc:permissions",
    "oc:size",
    "oc:owner-display-name",
    "oc:share-types",
    "nc:has-preview",
    "nc:hidden",
];

pub const TAG_PROPS: &[&str] = &[
    "oc:id",
    "oc:display-name",
    "oc:user-visible",
    "oc:user-assignable",
    "oc:can-assign",
    "d:getetag",
    "nc:color",
];

pub const COMMENT_PROPS: &[&str] = &[
    "oc:id",
    "oc:message",
    "oc:verb",
    "oc:actorType",
    "oc:actorId",
    "oc:actorDisplayName",
    "oc:creationDateTime",
    "oc:objectType",
    "oc:objectId",
    "oc:isUnread",
    "oc:mentions",
    "oc:referenceId",
    "oc:reactions",
];

fn prop_list(props: &[&str]) -> String {
    let inner: String = props.iter().map(|p| format!("<{p}/>")).collect();
    format!("<d:prop>{inner}</d:prop>")
}

fn propfind(props: &[&str]) -> String {
    format!(
        "{XML_DECL}<d:propfind {NAMESPACES}>{}</d:propfind>",
        prop_list(props)
    )
}

fn propertyupdate(set: &str) -> String {
    format!("{XML_DECL}<d:propertyupdate {NAMESPACES}><d:set><d:prop>{set}</d:prop></d:set></d:propertyupdate>")
}

/// `toUTCString`-style date, e.g. `Mon, 19 Oct 2026 10:00:00 GMT`.
pub fn http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn filter_comments(cursor: &PaginationCursor) -> String {
    let datetime = cursor
        .datetime
        .map(|dt| {
            format!(
                "<oc:datetime>{}</oc:datetime>",
                dt.to_rfc3339_opts(SecondsFormat::Millis, true)
            )
        })
        .unwrap_or_default();
    format!(
        "{XML_DECL}<oc:filter-comments {NAMESPACES}><oc:limit>{}</oc:limit><oc:offset>{}</oc:offset>{datetime}</oc:filter-comments>",
        cursor.limit, cursor.offset
    )
}

pub fn files_propfind() -> String {
    propfind(FILE_PROPS)
}

pub fn favorites_report() -> String {
    format!(
        "{XML_DECL}<oc:filter-files {NAMESPACES}>{}<oc:filter-rules><oc:favorite>1</oc:favorite></oc:filter-rules></oc:filter-files>",
        prop_list(FILE_PROPS)
    )
}

/// Basic search for files under `scope` modified within the recent window,
/// newest first.
pub fn recent_search(scope: &str, now: DateTime<Utc>) -> String {
    let since = (now - Duration::days(RECENT_WINDOW_DAYS)).timestamp();
    format!(
        concat!(
            "{decl}<d:searchrequest {ns}><d:basicsearch>",
            "<d:select>{props}</d:select>",
            "<d:from><d:scope><d:href>{scope}</d:href><d:depth>infinity</d:depth></d:scope></d:from>",
            "<d:where><d:and>",
            "<d:not><d:eq><d:prop><d:getcontenttype/></d:prop><d:literal>httpd/unix-directory</d:literal></d:eq></d:not>",
            "<d:gt><d:prop><d:getlastmodified/></d:prop><d:literal>{since}</d:literal></d:gt>",
            "</d:and></d:where>",
            "<d:orderby><d:order><d:prop><d:getlastmodified/></d:prop><d:descending/></d:order></d:orderby>",
            "<d:limit><d:nresults>{limit}</d:nresults></d:limit>",
            "</d:basicsearch></d:searchrequest>"
        ),
        decl = XML_DECL,
        ns = NAMESPACES,
        props = prop_list(FILE_PROPS),
        scope = escape(scope),
        since = since,
        limit = RECENT_LIMIT,
    )
}

pub fn tags_propfind() -> String {
    propfind(TAG_PROPS)
}

pub fn tag_update(tag: &SystemTag) -> String {
    let color = tag
        .color
        .as_deref()
        .map(|c| format!("<nc:color>{}</nc:color>", escape(c)))
        .unwrap_or_else(|| "<nc:color/>".to_string());
    propertyupdate(&format!(
        "<oc:display-name>{}</oc:display-name><oc:user-visible>{}</oc:user-visible><oc:user-assignable>{}</oc:user-assignable>{color}",
        escape(tag.display_name.as_str()),
        tag.user_visible,
        tag.user_assignable,
    ))
}

pub fn tag_objects_propfind() -> String {
    propfind(&["nc:object-ids", "d:getetag"])
}

pub fn tag_objects_update(objects: &[TagObject]) -> String {
    if objects.is_empty() {
        return format!(
            "{XML_DECL}<d:propertyupdate {NAMESPACES}><d:remove><d:prop><nc:object-ids/></d:prop></d:remove></d:propertyupdate>"
        );
    }
    let ids: String = objects
        .iter()
        .map(|o| {
            format!(
                "<nc:object-id><nc:id>{}</nc:id><nc:type>{}</nc:type></nc:object-id>",
                escape(o.id.as_str()),
                escape(o.object_type.as_str())
            )
        })
        .collect();
    propertyupdate(&format!("<nc:object-ids>{ids}</nc:object-ids>"))
}

pub fn comment_propfind() -> String {
    propfind(COMMENT_PROPS)
}

pub fn comment_message(message: &str) -> String {
    propertyupdate(&format!("<oc:message>{}</oc:message>", escape(message)))
}

pub fn read_marker(date: DateTime<Utc>) -> String {
    propertyupdate(&format!("<oc:readMarker>{}</oc:readMarker>", http_date(date)))
}
