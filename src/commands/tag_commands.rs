use crate::commands::{run, CommandResult, Notice};
use crate::error::AppError;
use crate::models::tag::{NewTag, SystemTag, TagObject, TagObjects};
use crate::state::AppState;

pub async fn list_tags(state: &AppState) -> CommandResult<Vec<SystemTag>> {
    run("list_tags", Notice::LoadTagsFailed, state.tags.fetch_tags()).await
}

pub async fn last_used_tag_ids(state: &AppState) -> CommandResult<Vec<u64>> {
    run(
        "last_used_tag_ids",
        Notice::LoadTagsFailed,
        state.tags.fetch_last_used_tag_ids(),
    )
    .await
}

/// Creates the tag and returns it as the server stored it.
pub async fn create_tag(state: &AppState, tag: NewTag) -> CommandResult<SystemTag> {
    run("create_tag", Notice::CreateTagFailed, async {
        let id = state.tags.create_tag(&tag).await?;
        state.tags.fetch_tag(id).await
    })
    .await
}

pub async fn update_tag(state: &AppState, tag: &SystemTag) -> CommandResult<()> {
    run("update_tag", Notice::UpdateTagFailed, state.tags.update_tag(tag)).await
}

pub async fn delete_tag(state: &AppState, id: u64) -> CommandResult<()> {
    run("delete_tag", Notice::DeleteTagFailed, state.tags.delete_tag(id)).await
}

pub async fn get_tag_objects(
    state: &AppState,
    id: u64,
    object_type: &str,
) -> CommandResult<TagObjects> {
    run(
        "get_tag_objects",
        Notice::LoadTagObjectsFailed,
        state.tags.get_tag_objects(id, object_type),
    )
    .await
}

/// Assigns or unassigns one object, re-reading the current assignment first
/// so the write carries a fresh etag.
pub async fn toggle_tag_object(
    state: &AppState,
    id: u64,
    object: TagObject,
    assigned: bool,
) -> CommandResult<TagObjects> {
    run("toggle_tag_object", Notice::UpdateTagObjectsFailed, async {
        let current = state.tags.get_tag_objects(id, &object.object_type).await?;
        let mut objects: Vec<TagObject> = current
            .objects
            .into_iter()
            .filter(|o| o.id != object.id)
            .collect();
        if assigned {
            objects.push(object.clone());
        }
        state
            .tags
            .set_tag_objects(id, &object.object_type, &objects, &current.etag)
            .await?;
        Ok::<_, AppError>(TagObjects {
            etag: current.etag,
            objects,
        })
    })
    .await
}
