//! Application router configuration with public, signed-in and admin route definitions.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    admin::{
        create_user_endpoint, delete_user_endpoint, get_admin_dashboard, get_admin_edit_user_page,
        get_new_user_page, update_user_endpoint,
    },
    api::{get_user_detail, get_users, search_users_endpoint},
    auth::{admin_guard, auth_guard, get_log_in_page, get_log_out, post_log_in},
    dashboard::get_dashboard_page,
    endpoints,
    home::get_home_page,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    poll::{add_transaction_endpoint, create_poll_endpoint, get_new_poll_page, get_poll_page},
    register_user::{get_register_page, register_user},
    user::{edit_user_endpoint, get_edit_user_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in),
        )
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(register_user),
        )
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .route(endpoints::USERS_API, get(get_users))
        .route(endpoints::USER_DETAIL_API, get(get_user_detail))
        .route(endpoints::SEARCH_USER_API, get(search_users_endpoint));

    // The admin guard reads the user ID added by the auth guard, so it is
    // layered first and ends up running second.
    let admin_routes = Router::new()
        .route(
            endpoints::ADMIN_DASHBOARD_VIEW,
            get(get_admin_dashboard).post(get_admin_dashboard),
        )
        .route(endpoints::ADMIN_NEW_USER_VIEW, get(get_new_user_page))
        .route(endpoints::ADMIN_USERS, post(create_user_endpoint))
        .route(
            endpoints::ADMIN_EDIT_USER_VIEW,
            get(get_admin_edit_user_page),
        )
        .route(
            endpoints::ADMIN_USER,
            put(update_user_endpoint).delete(delete_user_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard));

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::NEW_POLL_VIEW,
            get(get_new_poll_page).post(create_poll_endpoint),
        )
        .route(
            endpoints::POLL_VIEW,
            get(get_poll_page).post(add_transaction_endpoint),
        )
        .route(
            endpoints::EDIT_USER_VIEW,
            get(get_edit_user_page).post(edit_user_endpoint),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
