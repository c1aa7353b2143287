use std::sync::Arc;

use regex::Regex;

use crate::config::ClientConfig;
use crate::dav::http::HttpTransport;
use crate::dav::transport::DavTransport;
use crate::error::AppError;
use crate::models::view::PickerView;
use crate::services::comment_service::{Actor, CommentService};
use crate::services::lister::ResourceLister;
use crate::services::picker_service::PickerSession;
use crate::services::preview_queue::{DavPreviewLoader, PreviewQueue};
use crate::services::tag_service::TagService;

/// Everything a command needs, wired once per connection.
pub struct AppState {
    pub config: ClientConfig,
    pub blacklist: Option<Regex>,
    pub actor: Actor,
    pub lister: Arc<ResourceLister>,
    pub tags: TagService,
    pub comments: CommentService,
    pub previews: PreviewQueue,
}

impl AppState {
    pub fn new(config: ClientConfig, transport: Arc<dyn DavTransport>) -> Result<Self, AppError> {
        let blacklist = config.blacklist()?;
        let lister = Arc::new(ResourceLister::new(transport.clone(), &config));
        let previews = PreviewQueue::new(
            Arc::new(DavPreviewLoader::new(transport)),
            config.preview_concurrency,
        );
        let actor = Actor {
            id: config.username.clone(),
            display_name: config.username.clone(),
        };

        Ok(Self {
            tags: TagService::new(lister.clone()),
            comments: CommentService::new(lister.clone()),
            lister,
            previews,
            actor,
            blacklist,
            config,
        })
    }

    pub fn connect(config: ClientConfig) -> Result<Self, AppError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        tracing::info!(server = %config.dav_root_url(), user = %config.username, "connected client");
        Self::new(config, transport)
    }

    pub fn picker(&self, view: PickerView, path: &str) -> PickerSession {
        PickerSession::new(self.lister.clone(), view, path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dav::fake::FakeTransport;
    use crate::services::lister::tests::config;

    pub(crate) fn test_state(fake: &Arc<FakeTransport>) -> AppState {
        AppState::new(config(), fake.clone()).unwrap()
    }

    #[test]
    fn wires_services_from_config() {
        let fake = Arc::new(FakeTransport::new());
        let state = test_state(&fake);
        assert_eq!(state.actor.id, "alice");
        assert_eq!(state.lister.files_root(), "/files/alice");
        assert!(state.blacklist.as_ref().is_some_and(|re| re.is_match("x.part")));
        assert_eq!(state.previews.in_flight(), 0);
    }

    #[test]
    fn invalid_blacklist_fails_wiring() {
        let mut config = config();
        config.blacklist_files_regex = Some("[".to_string());
        let result = AppState::new(config, Arc::new(FakeTransport::new()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn picker_sessions_start_idle() {
        let fake = Arc::new(FakeTransport::new());
        let state = test_state(&fake);
        let session = state.picker(PickerView::Recent, "/x");
        let picker = session.state().await;
        assert_eq!(picker.slot.path, "/");
        assert!(!picker.loading());
    }
}
