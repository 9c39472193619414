//! HTML page routes. The page lock is only held while the page is read or
//! changed, never across a call to the donations API, so a slow upstream
//! call does not hold up rendering or other mutations.

use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::page::{DonationsApi, Mutation, Notification};
use crate::views::FormDraft;
use crate::AppState;

/// Loads the collection on first use.
async fn ensure_mounted(state: &AppState) {
    if !state.page.lock().await.begin_mount() {
        return;
    }
    let result = DonationsApi::list(&state.proxy).await;
    state.page.lock().await.finish_load(result);
}

async fn dispatch(state: &AppState, mutation: Mutation) {
    let settled = mutation.send(&state.proxy).await;
    state.page.lock().await.settle(settled);
}

pub async fn index(State(state): State<AppState>) -> Response {
    ensure_mounted(&state).await;
    let mut page = state.page.lock().await;
    let notifications = page.take_notifications();
    match page.render(&state.templates, &notifications) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Page render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Render Error").into_response()
        }
    }
}

pub async fn submit(State(state): State<AppState>, Form(draft): Form<FormDraft>) -> Redirect {
    ensure_mounted(&state).await;
    let begun = {
        let mut page = state.page.lock().await;
        page.update_draft(draft);
        let begun = page.begin_submit();
        if let Err(e) = &begun {
            tracing::warn!("Rejected donation form: {}", e);
            page.notify(Notification::error(format!("Please check the form: {}.", e)));
        }
        begun
    };
    if let Ok(mutation) = begun {
        dispatch(&state, mutation).await;
    }
    Redirect::to("/")
}

pub async fn edit(Path(id): Path<i64>, State(state): State<AppState>) -> Redirect {
    ensure_mounted(&state).await;
    if !state.page.lock().await.edit(id) {
        tracing::warn!("Edit requested for unknown donation {}", id);
    }
    Redirect::to("/")
}

pub async fn cancel_edit(State(state): State<AppState>) -> Redirect {
    state.page.lock().await.cancel_edit();
    Redirect::to("/")
}

pub async fn request_delete(Path(id): Path<i64>, State(state): State<AppState>) -> Redirect {
    state.page.lock().await.request_delete(id);
    Redirect::to("/")
}

pub async fn confirm_delete(State(state): State<AppState>) -> Redirect {
    let begun = state.page.lock().await.begin_confirmed_delete();
    match begun {
        Some(mutation) => dispatch(&state, mutation).await,
        None => tracing::debug!("Delete confirmed with nothing pending"),
    }
    Redirect::to("/")
}

pub async fn cancel_delete(State(state): State<AppState>) -> Redirect {
    state.page.lock().await.cancel_delete();
    Redirect::to("/")
}
