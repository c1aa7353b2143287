pub mod commands;
pub mod config;
pub mod dav;
pub mod error;
pub mod models;
pub(crate) mod scope_path;
pub mod services;
pub mod state;
pub mod validation;

pub use config::ClientConfig;
pub use error::AppError;
pub use models::resource::{DirectoryListing, ResourceRecord, ResourceType};
pub use state::AppState;

/// Installs the sentry client when `SENTRY_DSN` is set. Keep the guard alive
/// for the lifetime of the process.
pub fn init_error_reporting() -> Option<sentry::ClientInitGuard> {
    std::env::var("SENTRY_DSN")
        .ok()
        .filter(|dsn| !dsn.trim().is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    send_default_pii: false,
                    ..Default::default()
                },
            ))
        })
}
