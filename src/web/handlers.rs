//! Route handlers.
//!
//! Every protected route runs [`gate`] first: the signed session cookie must
//! name a live session that is logged in and not expired. Anything else
//! destroys the session and redirects to `/expired`.
//!
//! A request without a valid cookie to `/` or `/login` allocates a store
//! entry. Entries are only removed by logout or by the gate, so abandoned
//! sessions accumulate until the process restarts.

use axum::{
    body::Body,
    extract::{RawQuery, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, info};

use super::cookies;
use super::pages::{Page, ACCESS_BLOCKED};
use super::state::AppState;
use super::types::{AnswerForm, ErrorFlag, LoginForm};
use crate::error::GateError;
use crate::session::{Session, SessionId, SessionState};

type HandlerResult = Result<Response, Response>;

/// Attach `Set-Cookie` headers to a response.
fn with_cookies(cookies: Vec<String>, response: impl IntoResponse) -> Response {
    let headers = cookies
        .into_iter()
        .map(|cookie| (header::SET_COOKIE, cookie));
    (AppendHeaders(headers), response).into_response()
}

fn internal_error(e: GateError) -> Response {
    error!("request failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

fn blocked() -> Response {
    with_cookies(
        vec![
            cookies::clear_session_cookie(),
            cookies::clear_login_time_cookie(),
        ],
        Redirect::to("/expired"),
    )
}

/// Look up the live session named by the request cookie.
fn current_session(state: &AppState, headers: &HeaderMap) -> Result<Option<Session>, Response> {
    match cookies::session_id_from(headers, &state.settings.session_secret) {
        Some(id) => state.store.get(&id).map_err(internal_error),
        None => Ok(None),
    }
}

/// Allocate an anonymous session and the cookie naming it.
fn new_session(state: &AppState) -> Result<(SessionId, String), Response> {
    let id = state.store.create().map_err(internal_error)?;
    let signed = cookies::sign_session_id(&id, &state.settings.session_secret)
        .ok_or_else(|| internal_error(GateError::Server("cannot sign session cookie".into())))?;
    Ok((id, cookies::session_cookie(&signed)))
}

/// Reuse the request's session or create a new one.
///
/// Returns the id and, for a new session, the cookie to set.
fn ensure_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(SessionId, Option<String>), Response> {
    if let Some(session) = current_session(state, headers)? {
        return Ok((session.id, None));
    }

    let (id, cookie) = new_session(state)?;
    Ok((id, Some(cookie)))
}

/// The check shared by every protected route.
///
/// Returns the session snapshot when it may proceed. Otherwise the session
/// is destroyed and the caller gets the redirect to send.
fn gate(state: &AppState, headers: &HeaderMap) -> Result<Session, Response> {
    let now = state.now();

    let Some(session) = current_session(state, headers)? else {
        debug!("gated request without a session");
        return Err(blocked());
    };

    match session.state(now) {
        SessionState::LoggedIn | SessionState::Answered => Ok(session),
        SessionState::Expired => {
            info!(session = %session.id, "session expired");
            state.store.destroy(&session.id).map_err(internal_error)?;
            Err(blocked())
        }
        SessionState::Anonymous => {
            debug!(session = %session.id, "gated request before login");
            state.store.destroy(&session.id).map_err(internal_error)?;
            Err(blocked())
        }
    }
}

/// `GET /` - login page.
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> HandlerResult {
    let flag = ErrorFlag::from_query(query.as_deref());
    if let Some(session) = current_session(&state, &headers)? {
        if session.state(state.now()).is_gated_ok() {
            return Ok(Redirect::to("/problem").into_response());
        }
    }

    let (_, cookie) = ensure_session(&state, &headers)?;
    let page = Page::Login
        .render(&state.settings.views_dir, flag.is_set())
        .await;
    Ok(with_cookies(cookie.into_iter().collect(), page))
}

/// `POST /login` - check the credential pair.
///
/// A session whose login has expired cannot log in again; it is replaced by
/// a fresh one carrying a new cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> HandlerResult {
    let (mut id, cookie) = ensure_session(&state, &headers)?;
    let mut set_cookies: Vec<String> = cookie.into_iter().collect();

    if !state.settings.credentials_match(&form.id, &form.pw) {
        info!(session = %id, "login failed");
        return Ok(with_cookies(set_cookies, Redirect::to("/?error=1")));
    }

    let now = state.now();
    let current = state
        .store
        .get(&id)
        .map_err(internal_error)?
        .map(|session| session.state(now))
        .unwrap_or_default();

    if !current.can_transition_to(SessionState::LoggedIn) {
        info!(session = %id, state = ?current, "replacing session at login");
        state.store.destroy(&id).map_err(internal_error)?;
        let (fresh, cookie) = new_session(&state)?;
        id = fresh;
        set_cookies.push(cookie);
    }

    state
        .store
        .mark_logged_in(&id, now)
        .map_err(internal_error)?;
    info!(session = %id, "login succeeded");
    Ok(with_cookies(set_cookies, Redirect::to("/problem")))
}

/// `GET /problem` - fire the side-channel notification, then show the puzzle.
pub async fn problem(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    let session = gate(&state, &headers)?;

    let mut set_cookies = Vec::new();
    if let Some(login_time) = session.login_time {
        set_cookies.push(cookies::login_time_cookie(login_time));
    }

    // Detached: the response never waits on delivery.
    let _ = state.notifier.notify(state.settings.notify_message.clone());

    Ok(with_cookies(set_cookies, Redirect::to("/problem-page")))
}

/// `GET /problem-page` - the puzzle.
pub async fn problem_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> HandlerResult {
    gate(&state, &headers)?;
    let flag = ErrorFlag::from_query(query.as_deref());
    let page = Page::Problem
        .render(&state.settings.views_dir, flag.is_set())
        .await;
    Ok(page.into_response())
}

/// `POST /submit-answer` - check the puzzle answer.
pub async fn submit_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AnswerForm>,
) -> HandlerResult {
    let session = gate(&state, &headers)?;

    if !state.settings.answer_matches(&form.answer) {
        info!(session = %session.id, "wrong answer");
        return Ok(Redirect::to("/problem-page?error=1").into_response());
    }

    state
        .store
        .mark_answered(&session.id)
        .map_err(internal_error)?;
    info!(session = %session.id, "puzzle solved");
    Ok(Redirect::to("/success").into_response())
}

/// Gate plus the answered check used by the success and download routes.
fn unlocked(state: &AppState, headers: &HeaderMap) -> Result<Session, Response> {
    let session = gate(state, headers)?;
    if session.state(state.now()).is_unlocked() {
        Ok(session)
    } else {
        Err(Redirect::to("/expired").into_response())
    }
}

/// `GET /success` - shown after a correct answer.
pub async fn success(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    unlocked(&state, &headers)?;
    let page = Page::Success.render(&state.settings.views_dir, false).await;
    Ok(page.into_response())
}

fn download_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Download error").into_response()
}

/// `GET /download` - the prize file, streamed from disk.
pub async fn download(State(state): State<AppState>, request: Request) -> HandlerResult {
    let session = unlocked(&state, request.headers())?;
    let path = &state.settings.download_file;

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let status = response.status();
    if status == StatusCode::NOT_FOUND || status.is_server_error() {
        error!("Download failed: {}: {status}", path.display());
        return Ok(download_error());
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    let disposition = HeaderValue::try_from(content_disposition(&file_name))
        .map_err(|e| internal_error(GateError::Server(e.to_string())))?;
    info!(session = %session.id, file = %file_name, "download started");

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

/// `GET /logout` - destroy the session and return to the login page.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    if let Some(id) = cookies::session_id_from(&headers, &state.settings.session_secret) {
        if state.store.destroy(&id).map_err(internal_error)? {
            info!(session = %id, "logged out");
        }
    }

    Ok(with_cookies(
        vec![
            cookies::clear_session_cookie(),
            cookies::clear_login_time_cookie(),
        ],
        Redirect::to("/"),
    ))
}

/// `GET /expired` - the blocked page.
pub async fn expired() -> Html<&'static str> {
    Html(ACCESS_BLOCKED)
}
