use tokio_util::sync::CancellationToken;

use crate::commands::{run, CommandResult, Notice};
use crate::models::resource::ResourceRecord;
use crate::models::view::{PickerView, ViewConfig};
use crate::services::picker_service::{LoadOutcome, PickerSession};
use crate::services::view_service;
use crate::state::AppState;

/// Loads `path` in `session` and returns the filtered, sorted records.
/// A load superseded by a newer one resolves to `Ok(None)`.
pub async fn list_directory(
    session: &PickerSession,
    view: PickerView,
    path: &str,
    config: &ViewConfig,
) -> CommandResult<Vec<ResourceRecord>> {
    let outcome = run(
        "list_directory",
        Notice::LoadFilesFailed,
        session.load(view, path),
    )
    .await?;
    Ok(match outcome {
        Some(LoadOutcome::Loaded(listing)) => {
            Some(view_service::derive_view(&listing.contents, config))
        }
        Some(LoadOutcome::Superseded) | None => None,
    })
}

pub async fn create_directory(
    state: &AppState,
    parent: &str,
    name: &str,
) -> CommandResult<ResourceRecord> {
    run(
        "create_directory",
        Notice::CreateFolderFailed,
        state
            .lister
            .create_directory(parent, name, state.blacklist.as_ref()),
    )
    .await
}

/// Loads the thumbnail of a record shown in `session`.
pub async fn load_preview(state: &AppState, session: &PickerSession, id: &str) -> bool {
    session.load_preview(&state.previews, id).await
}

pub async fn stat(state: &AppState, path: &str) -> CommandResult<ResourceRecord> {
    let cancel = CancellationToken::new();
    run("stat", Notice::LoadFilesFailed, state.lister.stat(path, &cancel)).await
}
