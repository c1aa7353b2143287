//! Caller-facing actions. Each one resolves to `Ok(Some(value))` on success,
//! `Ok(None)` when its fetch was cancelled or superseded, and `Err(Notice)`
//! carrying a fixed user-facing message otherwise. The underlying error is
//! logged and reported, never shown.

use std::future::Future;

use serde::Serialize;

use crate::error::AppError;

pub mod comment_commands;
pub mod file_commands;
pub mod tag_commands;

pub type CommandResult<T> = Result<Option<T>, Notice>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    LoadFilesFailed,
    CreateFolderFailed,
    InvalidName,
    LoadCommentsFailed,
    PostCommentFailed,
    EditCommentFailed,
    DeleteCommentFailed,
    MarkReadFailed,
    LoadTagsFailed,
    CreateTagFailed,
    TagAlreadyExists,
    UpdateTagFailed,
    DeleteTagFailed,
    LoadTagObjectsFailed,
    UpdateTagObjectsFailed,
}

impl Notice {
    /// Stable translation key; matches the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            Self::LoadFilesFailed => "load_files_failed",
            Self::CreateFolderFailed => "create_folder_failed",
            Self::InvalidName => "invalid_name",
            Self::LoadCommentsFailed => "load_comments_failed",
            Self::PostCommentFailed => "post_comment_failed",
            Self::EditCommentFailed => "edit_comment_failed",
            Self::DeleteCommentFailed => "delete_comment_failed",
            Self::MarkReadFailed => "mark_read_failed",
            Self::LoadTagsFailed => "load_tags_failed",
            Self::CreateTagFailed => "create_tag_failed",
            Self::TagAlreadyExists => "tag_already_exists",
            Self::UpdateTagFailed => "update_tag_failed",
            Self::DeleteTagFailed => "delete_tag_failed",
            Self::LoadTagObjectsFailed => "load_tag_objects_failed",
            Self::UpdateTagObjectsFailed => "update_tag_objects_failed",
        }
    }

    /// Message through `translate`, falling back to the English text.
    pub fn localized<F>(self, translate: F) -> String
    where
        F: FnOnce(&'static str) -> Option<String>,
    {
        translate(self.key()).unwrap_or_else(|| self.message().to_string())
    }

    /// English text of the notice.
    pub fn message(self) -> &'static str {
        match self {
            Self::LoadFilesFailed => "Could not load the files in this folder",
            Self::CreateFolderFailed => "Could not create the folder",
            Self::InvalidName => "This name is not allowed",
            Self::LoadCommentsFailed => "Unable to load the comments list",
            Self::PostCommentFailed => "Error occurred while posting comment",
            Self::EditCommentFailed => "Error occurred while updating comment",
            Self::DeleteCommentFailed => "Error occurred while deleting comment",
            Self::MarkReadFailed => "Could not mark comments as read",
            Self::LoadTagsFailed => "Failed to load tags",
            Self::CreateTagFailed => "Failed to create tag",
            Self::TagAlreadyExists => "A tag with the same name already exists",
            Self::UpdateTagFailed => "Failed to update tag",
            Self::DeleteTagFailed => "Failed to delete tag",
            Self::LoadTagObjectsFailed => "Failed to load tagged objects",
            Self::UpdateTagObjectsFailed => "Failed to update tagged objects",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Notice {}

/// Logs `err` with the action that produced it and picks the notice to show.
pub fn report<T>(action: &'static str, notice: Notice, err: AppError) -> CommandResult<T> {
    match err {
        AppError::Cancelled => {
            tracing::debug!(action, "action cancelled");
            Ok(None)
        }
        AppError::Validation(reason) => {
            tracing::warn!(action, %reason, "rejected input");
            Err(Notice::InvalidName)
        }
        AppError::Conflict(reason) => {
            tracing::warn!(action, %reason, "conflict");
            Err(Notice::TagAlreadyExists)
        }
        err => {
            sentry::configure_scope(|scope| {
                scope.set_extra("action", serde_json::Value::String(action.to_string()));
            });
            let err = err.capture();
            tracing::error!(action, kind = err.kind(), "action failed");
            Err(notice)
        }
    }
}

pub(crate) async fn run<T, F>(action: &'static str, notice: Notice, fut: F) -> CommandResult<T>
where
    F: Future<Output = Result<T, AppError>>,
{
    match fut.await {
        Ok(value) => Ok(Some(value)),
        Err(err) => report(action, notice, err),
    }
}
