pub mod api_logs;
pub mod content;
pub mod import;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Import dialog
        .route("/admin/import/status", get(import::status))
        .route("/admin/import/events", get(import::events))
        .route("/admin/import/dismiss", post(import::dismiss))
        .route("/admin/import/:source", post(import::start))
        // Listings and selection
        .route("/admin/content/:item_type", get(content::list))
        .route(
            "/admin/content/:item_type/selection",
            put(content::replace_selection)
                .get(content::selection)
                .delete(content::clear_selection),
        )
        .route(
            "/admin/content/:item_type/selection/toggle",
            post(content::toggle_selection),
        )
        // Bulk changes
        .route(
            "/admin/content/:item_type/bulk-category",
            post(content::bulk_category),
        )
        .route(
            "/admin/content/:item_type/bulk-status",
            post(content::bulk_status),
        )
        .route(
            "/admin/content/:item_type/bulk-delete",
            post(content::bulk_delete),
        )
        // Backend call log
        .route("/admin/api-logs", get(api_logs::index))
        .route("/admin/api-logs/errors", get(api_logs::errors_since))
        .route("/admin/api-logs/:id", get(api_logs::detail))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
