//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/poll/{poll_id}', use [format_endpoint].

/// The homepage.
pub const ROOT: &str = "/";
/// The route for getting the log in page and submitting the log in form.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The route for getting the registration page and submitting the registration form.
pub const REGISTER_VIEW: &str = "/register";
/// The landing page for logged in users, lists the user's polls.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page and form endpoint for creating a poll owned by a user.
pub const NEW_POLL_VIEW: &str = "/new_poll/{user_id}";
/// The page for a poll and the endpoint for adding transactions to it.
pub const POLL_VIEW: &str = "/poll/{poll_id}";
/// The page and form endpoint for editing a user's profile.
pub const EDIT_USER_VIEW: &str = "/edit/{user_id}";
/// The page listing every user for administrators.
pub const ADMIN_DASHBOARD_VIEW: &str = "/admin_dashboard";
/// The page for administrators to create a user.
pub const ADMIN_NEW_USER_VIEW: &str = "/admin/users/new";
/// The route for administrators to create users.
pub const ADMIN_USERS: &str = "/admin/users";
/// The page for administrators to edit any field of a user.
pub const ADMIN_EDIT_USER_VIEW: &str = "/admin/users/{user_id}/edit";
/// The route for administrators to update or delete a user.
pub const ADMIN_USER: &str = "/admin/users/{user_id}";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The JSON route listing all users.
pub const USERS_API: &str = "/users";
/// The JSON route for a single user, selected with the `id` query parameter.
pub const USER_DETAIL_API: &str = "/userDetail";
/// The JSON route for searching users by `name` and `address`.
pub const SEARCH_USER_API: &str = "/searchUser";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/poll/{poll_id}', '{poll_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
