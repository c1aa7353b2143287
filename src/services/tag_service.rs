use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dav::bodies;
use crate::dav::multistatus::{DAV_NS, NC_NS};
use crate::dav::transport::{send_checked, DavMethod, DavRequest, Depth};
use crate::error::AppError;
use crate::models::tag::{NewTag, SystemTag, TagObject, TagObjects};
use crate::scope_path;
use crate::services::lister::ResourceLister;
use crate::validation::validate_tag_name;

pub const TAGS_ROOT: &str = "/systemtags";
pub const LAST_USED_PATH: &str = "/index.php/apps/systemtags/lastused";
const CONFLICT_MESSAGE: &str = "A tag with the same name already exists";

/// Id of a newly created resource, taken from the last non-empty path
/// segment of its `Content-Location`.
pub fn parse_id_from_location(location: &str) -> Option<u64> {
    let without_query = location.split(['?', '#']).next().unwrap_or(location);
    without_query
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()?
        .parse()
        .ok()
}

fn tag_path(id: u64) -> String {
    format!("{TAGS_ROOT}/{id}")
}

pub struct TagService {
    lister: Arc<ResourceLister>,
}

impl TagService {
    pub fn new(lister: Arc<ResourceLister>) -> Self {
        Self { lister }
    }

    pub async fn fetch_tags(&self) -> Result<Vec<SystemTag>, AppError> {
        let request = DavRequest::new(DavMethod::Propfind, TAGS_ROOT)
            .depth(Depth::One)
            .xml(bodies::tags_propfind());
        let entries = self
            .lister
            .fetch_entries(request, &CancellationToken::new())
            .await?;
        let listing = self.lister.split(&entries, "/", TAGS_ROOT)?;
        let tags = listing
            .contents
            .iter()
            .map(SystemTag::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = tags.len(), "fetched tags");
        Ok(tags)
    }

    pub async fn fetch_tag(&self, id: u64) -> Result<SystemTag, AppError> {
        let request = DavRequest::new(DavMethod::Propfind, tag_path(id))
            .depth(Depth::Zero)
            .xml(bodies::tags_propfind());
        let record = self
            .lister
            .query(request, "/", &CancellationToken::new())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Parse(format!("no entry returned for tag {id}")))?;
        SystemTag::from_record(&record)
    }

    pub async fn create_tag(&self, tag: &NewTag) -> Result<u64, AppError> {
        validate_tag_name(&tag.display_name)?;
        let request = DavRequest::new(DavMethod::Post, TAGS_ROOT).json(tag.to_payload());
        let response = self.lister.transport().send(request).await?;

        if response.status == 409 {
            return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
        }
        if !response.is_success() {
            return Err(AppError::transport(
                Some(response.status),
                format!("creating tag returned {}", response.status),
            ));
        }

        let location = response
            .header("Content-Location")
            .ok_or(AppError::MissingHeader("Content-Location"))?;
        let id = parse_id_from_location(location)
            .ok_or_else(|| AppError::Parse(format!("no tag id in location {location}")))?;
        tracing::info!(id, name = %tag.display_name, "created tag");
        Ok(id)
    }

    pub async fn update_tag(&self, tag: &SystemTag) -> Result<(), AppError> {
        validate_tag_name(&tag.display_name)?;
        let request =
            DavRequest::new(DavMethod::Proppatch, tag_path(tag.id)).xml(bodies::tag_update(tag));
        send_checked(self.lister.transport(), request).await?;
        Ok(())
    }

    pub async fn delete_tag(&self, id: u64) -> Result<(), AppError> {
        send_checked(
            self.lister.transport(),
            DavRequest::new(DavMethod::Delete, tag_path(id)),
        )
        .await?;
        tracing::info!(id, "deleted tag");
        Ok(())
    }

    pub async fn get_tag_objects(&self, id: u64, object_type: &str) -> Result<TagObjects, AppError> {
        let request = DavRequest::new(
            DavMethod::Propfind,
            scope_path::join(&tag_path(id), object_type),
        )
        .depth(Depth::Zero)
        .xml(bodies::tag_objects_propfind());
        let entries = self
            .lister
            .fetch_entries(request, &CancellationToken::new())
            .await?;
        let Some(entry) = entries.first() else {
            return Ok(TagObjects::default());
        };

        let etag = entry
            .prop(DAV_NS, "getetag")
            .and_then(Value::as_str)
            .map(|e| e.trim_matches('"').to_string())
            .unwrap_or_default();
        let objects = match entry.prop(NC_NS, "object-ids").and_then(|v| v.get("object-id")) {
            Some(Value::Array(items)) => items.iter().map(tag_object).collect::<Result<_, _>>()?,
            Some(item) => vec![tag_object(item)?],
            None => Vec::new(),
        };
        Ok(TagObjects { etag, objects })
    }

    /// Replaces the objects assigned to a tag. `etag` guards against
    /// concurrent edits; an empty list removes every assignment.
    pub async fn set_tag_objects(
        &self,
        id: u64,
        object_type: &str,
        objects: &[TagObject],
        etag: &str,
    ) -> Result<(), AppError> {
        let mut request = DavRequest::new(
            DavMethod::Proppatch,
            scope_path::join(&tag_path(id), object_type),
        )
        .xml(bodies::tag_objects_update(objects));
        if !etag.is_empty() {
            request = request.header("If-Match", format!("\"{etag}\""));
        }
        send_checked(self.lister.transport(), request).await?;
        Ok(())
    }

    pub async fn fetch_last_used_tag_ids(&self) -> Result<Vec<u64>, AppError> {
        let response = send_checked(
            self.lister.transport(),
            DavRequest::app(DavMethod::Get, LAST_USED_PATH),
        )
        .await?;
        let ids: Vec<Value> = serde_json::from_str(&response.body)?;
        ids.iter()
            .map(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }
            .ok_or_else(|| AppError::Parse(format!("invalid tag id {v}"))))
            .collect()
    }
}

fn tag_object(value: &Value) -> Result<TagObject, AppError> {
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Parse(format!("object-id without {name}")))
    };
    Ok(TagObject {
        id: field("id")?,
        object_type: field("type")?,
    })
}
