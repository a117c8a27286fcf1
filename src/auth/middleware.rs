//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{
        cookie::{
            DEFAULT_COOKIE_DURATION, extend_auth_cookie_duration_if_needed,
            get_token_from_cookies,
        },
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target, is_hx_request},
    },
    endpoints,
    user::{UserID, get_user_by_id},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection, used to look up the roles of signed-in users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Redirect to `url`, using an HTMX redirect if the request came from HTMX.
fn log_in_redirect(url: &str, is_hx_request: bool) -> Response {
    if is_hx_request {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}

/// Middleware function that checks for a valid authorization cookie.
///
/// The user ID is placed into the request and the request executed normally if
/// the cookie is valid, otherwise the client is redirected to the log-in page.
/// HTMX requests get an `HX-Redirect` header, all other requests get a 303.
/// The session is extended by [DEFAULT_COOKIE_DURATION] on every request.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let is_hx_request = is_hx_request(&request);
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        tracing::warn!("Invalid redirect URL from request. Falling back to dashboard.");

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return log_in_redirect(&log_in_redirect_url, is_hx_request);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return log_in_redirect(&log_in_redirect_url, is_hx_request),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), DEFAULT_COOKIE_DURATION) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that only lets administrators through.
///
/// Must run after [auth_guard], which provides the user ID. The signed-in
/// [crate::User] is placed into the request for the route handler.
/// Non-admins get a 403 page.
pub async fn admin_guard(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("Could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            // The account was deleted while the session was still valid.
            Err(Error::NotFound) => return Redirect::to(endpoints::LOG_OUT).into_response(),
            Err(error) => return error.into_response(),
        }
    };

    if !user.is_admin {
        tracing::warn!(
            "User {} tried to access admin route {}",
            user.id,
            request.uri().path()
        );
        return Error::Forbidden.into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}
