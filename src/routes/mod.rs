use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod donations;
pub mod ui;

/// Application routes without transport layers; `main` wraps this with CORS,
/// tracing, rate limiting and security headers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(health_check))
        // Proxy routes
        .route("/donations", get(donations::list_donations).post(donations::create_donation))
        .route(
            "/donations/{id}",
            get(donations::get_donation)
                .put(donations::update_donation)
                .delete(donations::delete_donation),
        )
        // Page actions
        .route("/ui/submit", post(ui::submit))
        .route("/ui/cancel", post(ui::cancel_edit))
        .route("/ui/edit/{id}", post(ui::edit))
        .route("/ui/delete/confirm", post(ui::confirm_delete))
        .route("/ui/delete/cancel", post(ui::cancel_delete))
        .route("/ui/delete/{id}", post(ui::request_delete))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
