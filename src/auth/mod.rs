//! Sessions for signed-in users: the auth cookie, the log-in and log-out
//! routes, and the middleware that guards protected routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, admin_guard, auth_guard};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
