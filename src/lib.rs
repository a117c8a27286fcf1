//! Pollsplit is a web app for splitting shared expenses.
//!
//! Users register, create polls (named groups of people sharing expenses),
//! record who paid what against a poll and view running tallies.
//! Administrators can manage every account.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! small read-only JSON API for user records.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod admin;
mod alert;
mod api;
mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod home;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod poll;
mod register_user;
mod routing;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{
    User, UserID, get_user_by_email, get_user_by_id, set_admin_flag, update_password,
};

use crate::{
    alert::Alert,
    html::error_view,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot tell which one was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The session token has expired or could not be extended.
    #[error("the session has expired")]
    SessionExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The submitted form or query had a missing or malformed field.
    ///
    /// The string describes the problem and is safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// The email address is already used by another account.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An administrator tried to delete their own account.
    #[error("administrators cannot delete their own account")]
    CannotDeleteSelf,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The signed-in user is not allowed to access the resource.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::NotFound
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code that best describes the error.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::CookieMissing | Error::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
            Error::TooWeak(_) | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::DuplicateEmail | Error::CannotDeleteSelf => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as an alert fragment for HTMX requests.
    ///
    /// Internal errors are logged and replaced with a generic message.
    fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match &self {
            Error::DuplicateEmail => Alert::error(
                "Email already registered",
                "Another account already uses this email address. Log in or choose a different email.",
            ),
            Error::CannotDeleteSelf => Alert::error(
                "Could not delete user",
                "You cannot delete the account you are logged in with.",
            ),
            Error::NotFound => Alert::error(
                "Not found",
                "The item could not be found. Try refreshing the page to see if it has been deleted.",
            ),
            Error::Forbidden => Alert::error(
                "Forbidden",
                "You do not have permission to do that.",
            ),
            Error::Validation(message) | Error::TooWeak(message) => {
                Alert::error("Invalid input", message)
            }
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                error_view(
                    "Forbidden",
                    "403",
                    "You do not have access to this page.",
                    "Log in with an account that has permission to view it.",
                ),
            )
                .into_response(),
            Error::Validation(ref message) | Error::TooWeak(ref message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                error_view("Invalid Request", "422", "The request was invalid.", message),
            )
                .into_response(),
            Error::DuplicateEmail | Error::CannotDeleteSelf => (
                StatusCode::CONFLICT,
                error_view("Conflict", "409", "The request conflicts with existing data.", &self.to_string()),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
