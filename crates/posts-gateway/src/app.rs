use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use posts_core::config::PostsConfig;
use posts_store::{ExecutionContext, PostRepository, StoreClient, StoreError};

use crate::http;
use crate::lifecycle::Lifecycle;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: PostsConfig,
    /// Record store client, chosen once at startup.
    pub store: StoreClient,
    /// Background work that must finish after its response is sent.
    pub lifecycle: Lifecycle,
}

impl AppState {
    pub fn new(config: PostsConfig, store: StoreClient) -> Self {
        Self {
            config,
            store,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Bindings for one invocation. Rebuilt per request, never cached.
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::from_config(&self.config)
    }

    /// Repository over the active store for the current invocation.
    pub fn repository(&self) -> Result<PostRepository, StoreError> {
        let ctx = self.execution_context();
        Ok(PostRepository::new(self.store.handle(&ctx)?))
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/api/posts", any(http::posts::posts_handler))
        .route("/api/scheduled", any(http::scheduled::scheduled_handler));

    // trigger routes dispatch on path alone, whatever the method
    if state.config.triggers.enabled {
        router = router
            .route(
                "/trigger/post-created",
                any(http::triggers::post_created_handler),
            )
            .route(
                "/trigger/post-updated",
                any(http::triggers::post_updated_handler),
            )
            .route("/trigger/cleanup", any(http::triggers::cleanup_handler))
            .route("/trigger/{*rest}", any(http::triggers::not_found_handler));
    }

    router
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
