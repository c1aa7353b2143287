use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::sync::Semaphore;

use crate::config::DEFAULT_PREVIEW_CONCURRENCY;
use crate::dav::transport::{send_checked, DavMethod, DavRequest, DavTransport};
use crate::error::AppError;

const PREVIEW_SIZE: u32 = 64;

#[async_trait]
pub trait PreviewLoader: Send + Sync {
    async fn load_preview(&self, path: &str) -> Result<(), AppError>;
}

/// Fetches thumbnails from the server's preview endpoint.
pub struct DavPreviewLoader {
    transport: Arc<dyn DavTransport>,
}

impl DavPreviewLoader {
    pub fn new(transport: Arc<dyn DavTransport>) -> Self {
        Self { transport }
    }

    pub fn preview_path(path: &str) -> String {
        format!(
            "/index.php/core/preview.png?file={}&x={PREVIEW_SIZE}&y={PREVIEW_SIZE}&a=1",
            utf8_percent_encode(path, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl PreviewLoader for DavPreviewLoader {
    async fn load_preview(&self, path: &str) -> Result<(), AppError> {
        let request = DavRequest::app(DavMethod::Get, Self::preview_path(path));
        send_checked(self.transport.as_ref(), request).await?;
        Ok(())
    }
}

/// Process-wide admission queue for preview loads. Waiters are admitted in
/// arrival order and at most `capacity` loads run at once. Cloning shares the
/// same queue.
#[derive(Clone)]
pub struct PreviewQueue {
    permits: Arc<Semaphore>,
    capacity: usize,
    loader: Arc<dyn PreviewLoader>,
}

impl PreviewQueue {
    pub fn new(loader: Arc<dyn PreviewLoader>, capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_PREVIEW_CONCURRENCY
        } else {
            capacity
        };
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            loader,
        }
    }

    /// `true` when the preview loaded, `false` on any failure.
    pub async fn load(&self, path: &str) -> bool {
        let Ok(_permit) = self.permits.acquire().await else {
            return false;
        };
        match self.loader.load_preview(path).await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(path, error = %err, "preview failed");
                false
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }
}
