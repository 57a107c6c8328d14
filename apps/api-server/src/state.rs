//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{
    CategoryRepository, Clock, CommentRepository, LocationRepository, Mailer, PostRepository,
    SystemClock, UserRepository,
};
use blogicum_infra::{InMemoryStore, LogMailer};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub site_url: String,
    pub mail_from: String,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let mailer = Self::mailer(config);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match blogicum_infra::database::connect(db_config).await {
                Ok(conn) => {
                    use blogicum_infra::database::{
                        PostgresCategoryRepository, PostgresCommentRepository,
                        PostgresLocationRepository, PostgresPostRepository,
                        PostgresUserRepository,
                    };

                    tracing::info!("Application state initialized (postgres)");
                    return Self {
                        users: Arc::new(PostgresUserRepository::new(conn.clone())),
                        categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
                        locations: Arc::new(PostgresLocationRepository::new(conn.clone())),
                        posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                        comments: Arc::new(PostgresCommentRepository::new(conn)),
                        mailer,
                        clock,
                        site_url: config.site_url.clone(),
                        mail_from: config.mail_from.clone(),
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        let state = Self::in_memory(
            InMemoryStore::new(),
            mailer,
            clock,
            config.site_url.clone(),
            config.mail_from.clone(),
        );
        tracing::info!("Application state initialized (in-memory)");
        state
    }

    /// State backed by an in-memory store.
    pub fn in_memory(
        store: InMemoryStore,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        site_url: String,
        mail_from: String,
    ) -> Self {
        Self {
            users: Arc::new(store.users()),
            categories: Arc::new(store.categories()),
            locations: Arc::new(store.locations()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            mailer,
            clock,
            site_url,
            mail_from,
        }
    }

    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        #[cfg(feature = "webhook-mail")]
        if let Some(url) = &config.mail_webhook_url {
            tracing::info!("Mail relay configured");
            return Arc::new(blogicum_infra::WebhookMailer::new(url.clone()));
        }

        if config.mail_webhook_url.is_some() {
            tracing::warn!("MAIL_WEBHOOK_URL ignored: built without webhook-mail feature");
        }
        Arc::new(LogMailer)
    }
}
