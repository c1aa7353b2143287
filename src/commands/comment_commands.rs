use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::commands::{run, CommandResult, Notice};
use crate::models::pagination::PaginationCursor;
use crate::models::resource::ResourceRecord;
use crate::services::comment_service::CommentsFeed;
use crate::services::lister::Collection;
use crate::state::AppState;

pub async fn list_comments(
    state: &AppState,
    resource_type: &str,
    resource_id: &str,
    cursor: PaginationCursor,
    cancel: &CancellationToken,
) -> CommandResult<Vec<ResourceRecord>> {
    let collection = Collection::comments(resource_type, resource_id);
    run(
        "list_comments",
        Notice::LoadCommentsFailed,
        state.lister.list_resources(&collection, cursor, cancel),
    )
    .await
}

/// Appends the next page to `feed`, returning how many comments arrived.
pub async fn load_more_comments(
    feed: &mut CommentsFeed,
    cancel: &CancellationToken,
) -> CommandResult<usize> {
    run("load_more_comments", Notice::LoadCommentsFailed, async {
        feed.next_page(cancel).await.map(|page| page.len())
    })
    .await
}

pub async fn post_comment(
    state: &AppState,
    resource_type: &str,
    resource_id: &str,
    message: &str,
) -> CommandResult<ResourceRecord> {
    run(
        "post_comment",
        Notice::PostCommentFailed,
        state
            .comments
            .post_comment(resource_type, resource_id, &state.actor, message),
    )
    .await
}

pub async fn edit_comment(
    state: &AppState,
    resource_type: &str,
    resource_id: &str,
    comment_id: &str,
    message: &str,
) -> CommandResult<()> {
    run(
        "edit_comment",
        Notice::EditCommentFailed,
        state
            .comments
            .edit_comment(resource_type, resource_id, comment_id, message),
    )
    .await
}

pub async fn delete_comment(
    state: &AppState,
    resource_type: &str,
    resource_id: &str,
    comment_id: &str,
) -> CommandResult<()> {
    run(
        "delete_comment",
        Notice::DeleteCommentFailed,
        state
            .comments
            .delete_comment(resource_type, resource_id, comment_id),
    )
    .await
}

pub async fn mark_comments_as_read(
    state: &AppState,
    resource_type: &str,
    resource_id: &str,
) -> CommandResult<()> {
    run(
        "mark_comments_as_read",
        Notice::MarkReadFailed,
        state
            .comments
            .mark_comments_as_read(resource_type, resource_id, Utc::now()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::dav::fake::FakeTransport;
    use crate::dav::transport::DavMethod;
    use crate::services::lister::tests::multistatus;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_cancelled_listing_is_silent() {
        let fake = Arc::new(FakeTransport::new());
        let state = test_state(&fake);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = list_comments(&state, "files", "1", PaginationCursor::default(), &cancel).await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_failed_listing_shows_notice() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Report, "/comments/files/1", 503, "");
        let state = test_state(&fake);

        let result = list_comments(
            &state,
            "files",
            "1",
            PaginationCursor::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(result, Err(Notice::LoadCommentsFailed));
    }

    #[tokio::test]
    async fn test_load_more_counts_new_comments() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Report, "/comments/files/1", 207, &multistatus(&[]));
        let state = test_state(&fake);
        let mut feed = state.comments.feed("files", "1");

        let added = load_more_comments(&mut feed, &CancellationToken::new()).await;
        assert_eq!(added, Ok(Some(0)));
        assert!(feed.is_done());
    }

    #[tokio::test]
    async fn test_post_without_location_fails_with_notice() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Post, "/comments/files/1", 201, "");
        let state = test_state(&fake);

        let result = post_comment(&state, "files", "1", "hello").await;
        assert_eq!(result, Err(Notice::PostCommentFailed));
    }

    #[tokio::test]
    async fn test_mark_read_and_delete() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Proppatch, "/comments/files/1", 207, "");
        fake.respond(DavMethod::Proppatch, "/comments/files/1/9", 207, "");
        let state = test_state(&fake);

        assert_eq!(mark_comments_as_read(&state, "files", "1").await, Ok(Some(())));
        assert_eq!(edit_comment(&state, "files", "1", "9", "edited").await, Ok(Some(())));
        assert_eq!(
            delete_comment(&state, "files", "1", "9").await,
            Err(Notice::DeleteCommentFailed)
        );
    }
}
