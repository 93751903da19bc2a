use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Largest accepted upload (images, recorder chunks)
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Only the asset bucket is public, never the record table next to it
    let media_path = format!("/media/{}", state.store.bucket());
    let media = ServeDir::new(state.store.bucket_dir());

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Draft lifecycle
        .route("/drafts", post(handlers::create_draft))
        .route(
            "/drafts/:draft_id",
            get(handlers::get_draft).delete(handlers::delete_draft),
        )
        .route("/drafts/:draft_id/fields", patch(handlers::update_fields))
        .route("/drafts/:draft_id/files/:field", put(handlers::upload_file))
        // Step navigation
        .route("/drafts/:draft_id/advance", post(handlers::advance))
        .route("/drafts/:draft_id/retreat", post(handlers::retreat))
        // Recording control
        .route(
            "/drafts/:draft_id/recording/start",
            post(handlers::start_recording),
        )
        .route(
            "/drafts/:draft_id/recording/pause",
            post(handlers::pause_recording),
        )
        .route(
            "/drafts/:draft_id/recording/resume",
            post(handlers::resume_recording),
        )
        .route(
            "/drafts/:draft_id/recording/stop",
            post(handlers::stop_recording),
        )
        .route(
            "/drafts/:draft_id/recording/discard",
            post(handlers::discard_recording),
        )
        .route(
            "/drafts/:draft_id/recording/fragments",
            post(handlers::push_fragment),
        )
        .route("/drafts/:draft_id/audio", delete(handlers::delete_audio))
        // Submission
        .route("/drafts/:draft_id/submit", post(handlers::submit))
        // Saved memories
        .route("/memories", get(handlers::list_memories))
        .route("/memories/:record_id", delete(handlers::delete_memory))
        // Stored assets
        .nest_service(&media_path, media)
        .layer(
            ServiceBuilder::new()
                // Add tracing middleware for request logging
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
