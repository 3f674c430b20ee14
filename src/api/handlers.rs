//! HTTP request handlers
//!
//! `GET /` and `POST /` each run one pass. A POST answers with a redirect so
//! the browser reruns the page with a plain GET.

use super::page::{render_error, render_html, PageUi};
use super::types::{ErrorResponse, HistoryResponse, PassForm};
use super::AppState;
use crate::bridge::BridgeError;
use crate::session::SessionContext;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::{headers::Cookie, TypedHeader};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

const SESSION_COOKIE: &str = "bridge_session";

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_page).post(submit_page))
        .route("/api/history", get(get_history))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn show_page(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Response {
    let (session_id, session, created) = state
        .sessions
        .get_or_create(session_cookie(cookies.as_ref()))
        .await;

    let mut ui = PageUi::new();
    let response = match run_pass(&state, &session, &mut ui).await {
        Ok(()) => html_page(StatusCode::OK, render_html(page_title(&state), ui.blocks())),
        Err(e) => AppError::Pass {
            title: page_title(&state).to_string(),
            error: e,
        }
        .into_response(),
    };
    with_session_cookie(response, &session_id, created)
}

async fn submit_page(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
    Form(form): Form<PassForm>,
) -> Response {
    let (session_id, session, created) = state
        .sessions
        .get_or_create(session_cookie(cookies.as_ref()))
        .await;

    let mut ui = PageUi::submitted(form.button, form.prompt);
    let response = match run_pass(&state, &session, &mut ui).await {
        Ok(()) => {
            tracing::debug!(
                session_id = %session_id,
                rerun = ui.rerun_requested(),
                "Pass submitted"
            );
            Redirect::to("/").into_response()
        }
        Err(e) => AppError::Pass {
            title: page_title(&state).to_string(),
            error: e,
        }
        .into_response(),
    };
    with_session_cookie(response, &session_id, created)
}

async fn run_pass(
    state: &AppState,
    session: &Mutex<SessionContext>,
    ui: &mut PageUi,
) -> Result<(), BridgeError> {
    // Holding the lock for the whole pass serializes tabs sharing a session
    let mut session = session.lock().await;
    state.bridge.run_pass(&mut session, ui).await
}

fn page_title(state: &AppState) -> &str {
    state
        .bridge
        .assistant()
        .name
        .as_deref()
        .unwrap_or("Assistant")
}

// ============================================================
// JSON API
// ============================================================

async fn get_history(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, AppError> {
    let session_id = session_cookie(cookies.as_ref())
        .ok_or_else(|| AppError::NotFound("No session cookie".to_string()))?;
    let handle: Arc<Mutex<SessionContext>> = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown session {session_id}")))?;
    let session = handle
        .try_lock()
        .map_err(|_| AppError::Conflict("An exchange is in progress".to_string()))?;

    let response = Json(HistoryResponse {
        assistant_id: &state.bridge.assistant().id,
        thread_id: session.thread().map(|t| t.id.as_str()),
        phase: session.phase(),
        messages: session.messages(),
    })
    .into_response();
    Ok(response)
}

async fn get_version() -> &'static str {
    concat!("embeddable-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Session Cookie
// ============================================================

fn session_cookie(cookies: Option<&TypedHeader<Cookie>>) -> Option<&str> {
    cookies.and_then(|TypedHeader(cookie)| cookie.get(SESSION_COOKIE))
}

fn with_session_cookie(mut response: Response, session_id: &str, created: bool) -> Response {
    if created {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    NotFound(String),
    Conflict(String),
    /// A failed pass, shown as an error page
    Pass { title: String, error: BridgeError },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Pass { title, error } => {
                let status = pass_status(&error);
                tracing::error!(error = %error, status = status.as_u16(), "Pass failed");
                return html_page(status, render_error(&title, &error.to_string()));
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn html_page(status: StatusCode, rendered: Result<String, fmt::Error>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Page rendering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn pass_status(error: &BridgeError) -> StatusCode {
    match error {
        BridgeError::Remote(_) | BridgeError::AssistantNotFound(_) | BridgeError::Transition(_) => {
            StatusCode::BAD_GATEWAY
        }
        BridgeError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::Configuration(_) | BridgeError::StateCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
