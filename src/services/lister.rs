use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::dav::bodies;
use crate::dav::multistatus::{parse_multistatus, DavEntry};
use crate::dav::props::record_from_entry;
use crate::dav::transport::{send_cancellable, send_checked, DavMethod, DavRequest, DavTransport, Depth};
use crate::error::AppError;
use crate::models::pagination::PaginationCursor;
use crate::models::resource::{DirectoryListing, ResourceRecord};
use crate::scope_path;
use crate::validation::validate_node_name;

pub const COMMENTS_ROOT: &str = "/comments";

/// A server collection that can be paged through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Comments {
        resource_type: String,
        resource_id: String,
    },
    /// Directory path relative to the user's files root.
    Directory(String),
}

impl Collection {
    pub fn comments(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::Comments {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }
}

pub fn comments_path(resource_type: &str, resource_id: &str) -> String {
    scope_path::join(&scope_path::join(COMMENTS_ROOT, resource_type), resource_id)
}

pub struct ResourceLister {
    transport: Arc<dyn DavTransport>,
    dav_root: String,
    files_root: String,
    page_limit: u32,
}

impl ResourceLister {
    pub fn new(transport: Arc<dyn DavTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            dav_root: config.dav_root_path(),
            files_root: config.files_root(),
            page_limit: config.page_limit,
        }
    }

    pub fn transport(&self) -> &dyn DavTransport {
        self.transport.as_ref()
    }

    pub fn files_root(&self) -> &str {
        &self.files_root
    }

    /// First page of a paginated collection at the configured page size.
    pub fn first_page(&self) -> PaginationCursor {
        PaginationCursor::from_parts(None, Some(self.page_limit), None)
    }

    /// One page of `collection`, in server order.
    pub async fn list_resources(
        &self,
        collection: &Collection,
        cursor: PaginationCursor,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, AppError> {
        match collection {
            Collection::Comments {
                resource_type,
                resource_id,
            } => {
                let request = DavRequest::new(
                    DavMethod::Report,
                    comments_path(resource_type, resource_id),
                )
                .xml(bodies::filter_comments(&cursor));
                let records = self.query(request, "/", cancel).await?;
                tracing::debug!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    offset = cursor.offset,
                    count = records.len(),
                    "fetched comments page"
                );
                Ok(records)
            }
            Collection::Directory(path) => {
                let listing = self.list_directory(path, cancel).await?;
                Ok(cursor.window(listing.contents))
            }
        }
    }

    pub async fn list_directory(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<DirectoryListing, AppError> {
        let path = scope_path::normalize(path);
        let request = DavRequest::new(
            DavMethod::Propfind,
            scope_path::join(&self.files_root, &path),
        )
        .depth(Depth::One)
        .xml(bodies::files_propfind());
        let entries = self.fetch_entries(request, cancel).await?;
        let listing = self.split(&entries, &self.files_root, &path)?;
        tracing::debug!(path = %path, count = listing.contents.len(), "listed directory");
        Ok(listing)
    }

    pub async fn list_favorites(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, AppError> {
        let request = DavRequest::new(DavMethod::Report, self.files_root.clone())
            .xml(bodies::favorites_report());
        let root = self.files_root.clone();
        self.query(request, &root, cancel).await
    }

    /// Files modified during the last two weeks before `now`, newest first.
    pub async fn list_recent(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, AppError> {
        let request = DavRequest::new(DavMethod::Search, "/")
            .xml(bodies::recent_search(&self.files_root, now));
        let root = self.files_root.clone();
        self.query(request, &root, cancel).await
    }

    pub async fn stat(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<ResourceRecord, AppError> {
        let request = DavRequest::new(
            DavMethod::Propfind,
            scope_path::join(&self.files_root, path),
        )
        .depth(Depth::Zero)
        .xml(bodies::files_propfind());
        let root = self.files_root.clone();
        self.query(request, &root, cancel)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Parse(format!("no entry returned for {path}")))
    }

    pub async fn create_directory(
        &self,
        parent: &str,
        name: &str,
        blacklist: Option<&Regex>,
    ) -> Result<ResourceRecord, AppError> {
        validate_node_name(name, blacklist)?;
        let path = scope_path::join(parent, name.trim());
        send_checked(
            self.transport(),
            DavRequest::new(DavMethod::Mkcol, scope_path::join(&self.files_root, &path)),
        )
        .await?;
        tracing::info!(path = %path, "created directory");
        self.stat(&path, &CancellationToken::new()).await
    }

    pub(crate) async fn fetch_entries(
        &self,
        request: DavRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<DavEntry>, AppError> {
        let response = send_cancellable(self.transport(), request, cancel).await?;
        parse_multistatus(&response.body)
    }

    /// Fetches and maps every entry, with paths relative to `scope`
    /// (a collection path under the DAV root).
    pub(crate) async fn query(
        &self,
        request: DavRequest,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, AppError> {
        let entries = self.fetch_entries(request, cancel).await?;
        self.map_entries(&entries, scope)
    }

    fn locate(&self, href: &str, scope: &str) -> Option<String> {
        let root = format!("{}{}", self.dav_root, scope_path::normalize(scope));
        scope_path::relative_to(href_path(href), &root)
    }

    fn map_entries(&self, entries: &[DavEntry], scope: &str) -> Result<Vec<ResourceRecord>, AppError> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.locate(&entry.href, scope) {
                Some(path) => records.push(record_from_entry(entry, path)?),
                None => tracing::warn!(href = %entry.href, scope, "skipping entry outside scope"),
            }
        }
        Ok(records)
    }

    /// Separates the collection's own entry from its children.
    pub(crate) fn split(
        &self,
        entries: &[DavEntry],
        scope: &str,
        collection: &str,
    ) -> Result<DirectoryListing, AppError> {
        let collection = scope_path::normalize(collection);
        let mut listing = DirectoryListing::default();
        for entry in entries {
            let Some(path) = self.locate(&entry.href, scope) else {
                tracing::warn!(href = %entry.href, scope, "skipping entry outside scope");
                continue;
            };
            if path == collection {
                match record_from_entry(entry, path) {
                    Ok(folder) => listing.folder = Some(folder),
                    Err(err) => tracing::debug!(error = %err, "collection entry not mappable"),
                }
            } else {
                listing.contents.push(record_from_entry(entry, path)?);
            }
        }
        Ok(listing)
    }
}

/// Hrefs are usually absolute paths, but some servers send full URLs.
fn href_path(href: &str) -> &str {
    match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => href,
    }
}
