use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    Get,
    Post,
    Put,
    Delete,
    Mkcol,
    Propfind,
    Proppatch,
    Report,
    Search,
}

impl DavMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Mkcol => "MKCOL",
            Self::Propfind => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Report => "REPORT",
            Self::Search => "SEARCH",
        }
    }
}

impl std::fmt::Display for DavMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
}

impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Xml(String),
    Json(serde_json::Value),
}

/// A request against a path relative to the DAV root (or, for `absolute`
/// requests, relative to the server origin).
#[derive(Debug, Clone, PartialEq)]
pub struct DavRequest {
    pub method: DavMethod,
    pub path: String,
    pub absolute: bool,
    pub depth: Option<Depth>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl DavRequest {
    pub fn new(method: DavMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            absolute: false,
            depth: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Request outside the DAV tree, e.g. an app JSON endpoint.
    pub fn app(method: DavMethod, path: impl Into<String>) -> Self {
        Self {
            absolute: true,
            ..Self::new(method, path)
        }
    }

    pub fn depth(mut self, depth: Depth) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn xml(mut self, body: String) -> Self {
        self.body = Some(RequestBody::Xml(body));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DavResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl DavResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait DavTransport: Send + Sync {
    async fn send(&self, request: DavRequest) -> Result<DavResponse, AppError>;
}

/// Sends `request` and turns any non-2xx status into a transport error.
pub async fn send_checked(
    transport: &dyn DavTransport,
    request: DavRequest,
) -> Result<DavResponse, AppError> {
    let method = request.method;
    let path = request.path.clone();
    let response = transport.send(request).await?;
    if !response.is_success() {
        tracing::debug!(%method, %path, status = response.status, "request failed");
        return Err(AppError::transport(
            Some(response.status),
            format!("{method} {path} returned {}", response.status),
        ));
    }
    Ok(response)
}

/// Like [`send_checked`], but resolves to [`AppError::Cancelled`] as soon as
/// `cancel` fires; the in-flight request future is dropped.
pub async fn send_cancellable(
    transport: &dyn DavTransport,
    request: DavRequest,
    cancel: &CancellationToken,
) -> Result<DavResponse, AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = send_checked(transport, request) => result,
    }
}
