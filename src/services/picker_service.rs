use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::picker::{Phase, PickerEvent, PickerState, Slot};
use crate::models::resource::{DirectoryListing, ResourceRecord};
use crate::models::view::{PickerView, ViewConfig};
use crate::services::lister::ResourceLister;
use crate::services::preview_queue::PreviewQueue;
use crate::services::view_service;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(DirectoryListing),
    /// A newer load started before this one finished; nothing was committed.
    Superseded,
}

/// Picker state plus the bookkeeping of the fetch that may commit into it.
/// Kept under one lock so a load's generation, token and `FetchStarted`
/// are always issued in the same order.
struct Inner {
    picker: PickerState,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

/// Drives a [`PickerState`] against the server. Only the most recently
/// started load may commit its listing.
pub struct PickerSession {
    lister: Arc<ResourceLister>,
    inner: Mutex<Inner>,
}

impl PickerSession {
    pub fn new(lister: Arc<ResourceLister>, view: PickerView, path: &str) -> Self {
        Self {
            lister,
            inner: Mutex::new(Inner {
                picker: PickerState::new(Slot::new(view, path)),
                generation: 0,
                in_flight: None,
            }),
        }
    }

    pub async fn state(&self) -> PickerState {
        self.inner.lock().await.picker.clone()
    }

    async fn apply(&self, event: PickerEvent) -> PickerState {
        let mut inner = self.inner.lock().await;
        inner.picker = inner.picker.clone().apply(event);
        inner.picker.clone()
    }

    /// Applies the completion event of `generation`, dropping its token if it
    /// is still the in-flight one.
    async fn finish(&self, generation: u64, event: PickerEvent) -> PickerState {
        let mut inner = self.inner.lock().await;
        if inner.generation == generation {
            inner.in_flight = None;
        }
        inner.picker = inner.picker.clone().apply(event);
        inner.picker.clone()
    }

    /// Aborts the in-flight load, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.inner.lock().await.in_flight.take() {
            token.cancel();
        }
    }

    pub async fn load(&self, view: PickerView, path: &str) -> Result<LoadOutcome, AppError> {
        let slot = Slot::new(view, path);
        let (generation, token) = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            let generation = inner.generation;
            let token = CancellationToken::new();
            if let Some(previous) = inner.in_flight.replace(token.clone()) {
                previous.cancel();
            }
            inner.picker = inner
                .picker
                .clone()
                .apply(PickerEvent::Navigate(slot.clone()))
                .apply(PickerEvent::FetchStarted { generation });
            (generation, token)
        };
        tracing::debug!(view = %slot.view, path = %slot.path, generation, "picker load started");

        let result = self.fetch(&slot, &token).await;

        let outcome = match result {
            Ok(listing) => {
                let state = self
                    .finish(
                        generation,
                        PickerEvent::FetchCompleted {
                            generation,
                            listing: listing.clone(),
                        },
                    )
                    .await;
                match state.phase {
                    Phase::Loaded { generation: g, .. } if g == generation => {
                        Ok(LoadOutcome::Loaded(listing))
                    }
                    _ => Ok(LoadOutcome::Superseded),
                }
            }
            Err(err) if err.is_cancelled() => {
                self.finish(generation, PickerEvent::FetchCancelled { generation })
                    .await;
                Ok(LoadOutcome::Superseded)
            }
            Err(err) => {
                let state = self
                    .finish(generation, PickerEvent::FetchFailed { generation })
                    .await;
                match state.phase {
                    Phase::Failed { generation: g } if g == generation => Err(err),
                    _ => Ok(LoadOutcome::Superseded),
                }
            }
        };

        if matches!(outcome, Ok(LoadOutcome::Superseded)) {
            tracing::debug!(generation, "picker load superseded");
        }
        outcome
    }

    async fn fetch(
        &self,
        slot: &Slot,
        cancel: &CancellationToken,
    ) -> Result<DirectoryListing, AppError> {
        match slot.view {
            PickerView::Files => self.lister.list_directory(&slot.path, cancel).await,
            PickerView::Recent => Ok(DirectoryListing {
                folder: None,
                contents: self.lister.list_recent(Utc::now(), cancel).await?,
            }),
            PickerView::Favorites => Ok(DirectoryListing {
                folder: None,
                contents: self.lister.list_favorites(cancel).await?,
            }),
        }
    }

    /// The loaded records as the picker displays them.
    pub async fn view(&self, config: &ViewConfig) -> Vec<ResourceRecord> {
        view_service::derive_view(self.inner.lock().await.picker.records(), config)
    }

    /// Loads the thumbnail of record `id` through `previews` and flags the
    /// record once it arrived. `false` when the record is not in the current
    /// listing or the preview failed.
    pub async fn load_preview(&self, previews: &PreviewQueue, id: &str) -> bool {
        let target = {
            let inner = self.inner.lock().await;
            match &inner.picker.phase {
                Phase::Loaded { generation, listing } => listing
                    .contents
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| (*generation, r.path.clone())),
                _ => None,
            }
        };
        let Some((generation, path)) = target else {
            return false;
        };
        if !previews.load(&path).await {
            return false;
        }
        self.apply(PickerEvent::PreviewLoaded {
            generation,
            id: id.to_string(),
        })
        .await;
        true
    }

    pub async fn toggle_select(&self, id: &str, multiselect: bool) -> Vec<String> {
        self.apply(PickerEvent::ToggleSelect {
            id: id.to_string(),
            multiselect,
        })
        .await
        .selected_ids
    }

    /// Selects every selectable visible record, or clears the selection when
    /// it already covers them.
    pub async fn select_all(&self, config: &ViewConfig) -> Vec<String> {
        let visible = self.view(config).await;
        let ids = view_service::selectable(&visible, config)
            .into_iter()
            .map(|r| r.id.clone())
            .collect();
        self.apply(PickerEvent::SelectAll { ids }).await.selected_ids
    }

    pub async fn clear_selection(&self) {
        self.apply(PickerEvent::ClearSelection).await;
    }
}
