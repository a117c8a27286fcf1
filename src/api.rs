//! Read-only JSON endpoints for looking up user records.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    user::{User, UserID, format_dob, get_all_users, get_user_by_id, search_users},
};

/// The state needed for the JSON endpoints.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The public fields of a user. The password hash and admin flag are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Date of birth formatted as "YYYY-MM-DD".
    pub dob: String,
    pub address: String,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            dob: format_dob(user.dob),
            address: user.address.clone(),
        }
    }
}

fn json_error(status_code: StatusCode, message: &str) -> Response {
    (status_code, Json(json!({ "error": message }))).into_response()
}

fn internal_error(error: Error) -> Response {
    tracing::error!("An unexpected error occurred in the JSON API: {error}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "an unexpected error occurred")
}

/// List every user ordered by ID. Responds with `[]` when there are no users.
pub async fn get_users(State(state): State<ApiState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return internal_error(Error::DatabaseLockError);
        }
    };

    match get_all_users(&connection) {
        Ok(users) => Json(users.iter().map(UserRecord::from).collect::<Vec<_>>()).into_response(),
        Err(error) => internal_error(error),
    }
}

/// The query parameters for [get_user_detail].
#[derive(Debug, Deserialize)]
pub struct UserDetailQuery {
    pub id: Option<String>,
}

/// Get the user with the ID in the `id` query parameter.
///
/// Responds with `{}` if there is no such user and 400 Bad Request if `id`
/// is missing or not an integer.
pub async fn get_user_detail(
    State(state): State<ApiState>,
    Query(query): Query<UserDetailQuery>,
) -> Response {
    let Some(raw_id) = query.id else {
        return json_error(StatusCode::BAD_REQUEST, "missing query parameter \"id\"");
    };

    let Ok(id) = raw_id.trim().parse::<i64>() else {
        return json_error(
            StatusCode::BAD_REQUEST,
            &format!("\"{raw_id}\" is not a valid user ID"),
        );
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return internal_error(Error::DatabaseLockError);
        }
    };

    match get_user_by_id(UserID::new(id), &connection) {
        Ok(user) => Json(UserRecord::from(&user)).into_response(),
        Err(Error::NotFound) => Json(json!({})).into_response(),
        Err(error) => internal_error(error),
    }
}

/// The query parameters for [search_users_endpoint].
#[derive(Debug, Deserialize)]
pub struct SearchUserQuery {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Find the users whose first name matches the first word of `name` and
/// whose address matches `address`, ignoring case.
///
/// Responds with 400 Bad Request if either parameter is missing.
pub async fn search_users_endpoint(
    State(state): State<ApiState>,
    Query(query): Query<SearchUserQuery>,
) -> Response {
    let (Some(name), Some(address)) = (query.name, query.address) else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "the query parameters \"name\" and \"address\" are required",
        );
    };

    let Some(first_name) = name.split_whitespace().next() else {
        return Json(Vec::<UserRecord>::new()).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return internal_error(Error::DatabaseLockError);
        }
    };

    match search_users(first_name, &address, &connection) {
        Ok(users) => Json(users.iter().map(UserRecord::from).collect::<Vec<_>>()).into_response(),
        Err(error) => internal_error(error),
    }
}
