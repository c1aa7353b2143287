use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use davpicker_lib::commands::{comment_commands, file_commands, tag_commands};
use davpicker_lib::models::pagination::PaginationCursor;
use davpicker_lib::models::tag::NewTag;
use davpicker_lib::models::view::{PickerView, SortConfig, SortKey, SortOrder, ViewConfig};
use davpicker_lib::{AppState, ClientConfig, ResourceRecord};

#[derive(Parser)]
#[command(name = "davpicker", version, about = "Browse, tag and comment on files over WebDAV")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a folder, recent files or favorites
    Ls {
        #[arg(default_value = "/")]
        path: String,
        #[arg(long, default_value = "files")]
        view: PickerView,
        #[arg(long)]
        show_hidden: bool,
        /// MIME patterns such as `image/*`; folders always pass
        #[arg(long = "mime")]
        mime_filter: Vec<String>,
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value = "name")]
        sort: SortKey,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
        #[arg(long)]
        no_folders_first: bool,
        #[arg(long)]
        no_favorites_first: bool,
    },
    Stat {
        path: String,
    },
    Mkdir {
        parent: String,
        name: String,
    },
    /// Fetch one page of comments on a resource
    Comments {
        resource_type: String,
        resource_id: String,
        #[arg(long)]
        offset: Option<u32>,
        /// Page size; defaults to `page_limit` from the config
        #[arg(long)]
        limit: Option<u32>,
        /// Skip comments older than this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    Comment {
        resource_type: String,
        resource_id: String,
        message: String,
    },
    MarkRead {
        resource_type: String,
        resource_id: String,
    },
    Tags {
        #[arg(long)]
        last_used: bool,
    },
    TagCreate {
        name: String,
        #[arg(long)]
        invisible: bool,
        #[arg(long)]
        restricted: bool,
        #[arg(long)]
        color: Option<String>,
    },
    TagDelete {
        id: u64,
    },
    /// Request a thumbnail through the preview queue
    Preview {
        paths: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("davpicker=info,davpicker_lib=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_records(records: &[ResourceRecord], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&records);
    }
    for record in records {
        let kind = if record.is_folder() { "d" } else { "-" };
        let star = if record.favorite { "*" } else { " " };
        let mtime = record
            .mtime
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{kind}{star} {:>12} {mtime:>16}  {}",
            record.size, record.path
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let _sentry = davpicker_lib::init_error_reporting();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let state = AppState::connect(config)?;
    let json = cli.json;

    match cli.command {
        Command::Ls {
            path,
            view,
            show_hidden,
            mime_filter,
            filter,
            sort,
            order,
            no_folders_first,
            no_favorites_first,
        } => {
            let config = ViewConfig {
                show_hidden,
                mime_filter,
                text_filter: filter,
                sort: SortConfig {
                    sort_by: sort,
                    order,
                },
                sort_folders_first: !no_folders_first,
                sort_favorites_first: !no_favorites_first,
                ..ViewConfig::default()
            };
            let session = state.picker(view, &path);
            if let Some(records) =
                file_commands::list_directory(&session, view, &path, &config).await?
            {
                print_records(&records, json)?;
            }
        }
        Command::Stat { path } => {
            if let Some(record) = file_commands::stat(&state, &path).await? {
                print_records(&[record], json)?;
            }
        }
        Command::Mkdir { parent, name } => {
            if let Some(record) = file_commands::create_directory(&state, &parent, &name).await? {
                print_records(&[record], json)?;
            }
        }
        Command::Comments {
            resource_type,
            resource_id,
            offset,
            limit,
            since,
        } => {
            let limit = limit.or(Some(state.config.page_limit));
            let cursor = PaginationCursor::from_parts(offset, limit, since);
            let cancel = CancellationToken::new();
            if let Some(comments) = comment_commands::list_comments(
                &state,
                &resource_type,
                &resource_id,
                cursor,
                &cancel,
            )
            .await?
            {
                if json {
                    print_json(&comments)?;
                } else {
                    for c in &comments {
                        println!(
                            "#{} {}: {}",
                            c.id,
                            c.extra_str("actorDisplayName").unwrap_or("?"),
                            c.extra_str("message").unwrap_or_default()
                        );
                    }
                }
            }
        }
        Command::Comment {
            resource_type,
            resource_id,
            message,
        } => {
            if let Some(comment) =
                comment_commands::post_comment(&state, &resource_type, &resource_id, &message)
                    .await?
            {
                println!("posted comment {}", comment.id);
            }
        }
        Command::MarkRead {
            resource_type,
            resource_id,
        } => {
            comment_commands::mark_comments_as_read(&state, &resource_type, &resource_id).await?;
        }
        Command::Tags { last_used } => {
            if last_used {
                if let Some(ids) = tag_commands::last_used_tag_ids(&state).await? {
                    print_json(&ids)?;
                }
            } else if let Some(tags) = tag_commands::list_tags(&state).await? {
                if json {
                    print_json(&tags)?;
                } else {
                    for tag in &tags {
                        println!(
                            "{:>6}  {}{}",
                            tag.id,
                            tag.display_name,
                            if tag.user_visible { "" } else { " (invisible)" }
                        );
                    }
                }
            }
        }
        Command::TagCreate {
            name,
            invisible,
            restricted,
            color,
        } => {
            let tag = NewTag {
                user_visible: !invisible,
                user_assignable: !restricted,
                color,
                ..NewTag::named(name)
            };
            if let Some(created) = tag_commands::create_tag(&state, tag).await? {
                println!("created tag {} ({})", created.id, created.display_name);
            }
        }
        Command::TagDelete { id } => {
            tag_commands::delete_tag(&state, id).await?;
        }
        Command::Preview { paths } => {
            let handles: Vec<_> = paths
                .into_iter()
                .map(|path| {
                    let queue = state.previews.clone();
                    tokio::spawn(async move {
                        let ok = queue.load(&path).await;
                        (path, ok)
                    })
                })
                .collect();
            for handle in handles {
                let (path, ok) = handle.await?;
                println!("{} {path}", if ok { "ok  " } else { "fail" });
            }
        }
    }

    Ok(())
}
