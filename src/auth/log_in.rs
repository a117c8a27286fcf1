//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{invalidate_auth_cookie, redirect::normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{base, log_in_register, password_input, submit_button, text_input},
    user::{User, get_user_by_email},
};

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_VIEW)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#user_password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("Email", "user_email", "email", email, None))
            (password_input("user_password", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &content).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The message shown for both an unknown email and a wrong password.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid Password or Username";

const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// Find the user registered with `email` and check their password.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if no user has `email` or the
/// password does not match.
fn verify_credentials(
    email: &str,
    password: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let user = match get_user_by_email(email.trim(), connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if user.check_password(password) {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to `redirect_url` if given, otherwise to the admin dashboard
/// for administrators and the dashboard for everyone else.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let result = match state.db_connection.lock() {
        Ok(connection) => {
            verify_credentials(&user_data.user_email, &user_data.user_password, &connection)
        }
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            return log_in_form(
                &user_data.user_email,
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url,
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(&user_data.user_email, Some(INTERNAL_ERROR_MSG), redirect_url)
                .into_response();
        }
    };

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let redirect_url = match redirect_url {
        Some(redirect_url) => redirect_url,
        None if user.is_admin => endpoints::ADMIN_DASHBOARD_VIEW,
        None => endpoints::DASHBOARD_VIEW,
    };

    tracing::info!("User {} logged in", user.id);

    set_auth_cookie(jar.clone(), user.id, cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(redirect_url.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub user_email: String,

    /// Password entered during log-in.
    pub user_password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}


#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
        routing::post,
    };
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        endpoints,
        test_utils::{assert_hx_redirect, get_test_connection, parse_html_fragment},
        user::test_utils::{insert_user, user_details},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION,
        post_log_in,
    };

    const PASSWORD: &str = "correct horse battery staple";

    /// A log-in state with a regular user alice@example.com and an admin
    /// bob@example.com, both with the password [PASSWORD].
    fn get_test_state() -> LoginState {
        let connection = get_test_connection();
        insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            PASSWORD,
            &connection,
        );
        insert_user(
            user_details("Bob", "bob@example.com"),
            true,
            PASSWORD,
            &connection,
        );

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn log_in_data(email: &str, password: &str) -> LogInData {
        LogInData {
            user_email: email.to_owned(),
            user_password: password.to_owned(),
            remember_me: None,
            redirect_url: None,
        }
    }

    async fn new_log_in_request(state: LoginState, log_in_form: LogInData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_log_in(State(state), jar, Form(log_in_form)).await
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let response = new_log_in_request(
            get_test_state(),
            log_in_data("alice@example.com", PASSWORD),
        )
        .await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert!(response.headers().get("set-cookie").is_some());
    }

    #[tokio::test]
    async fn admin_log_in_redirects_to_admin_dashboard() {
        let response =
            new_log_in_request(get_test_state(), log_in_data("bob@example.com", PASSWORD)).await;

        assert_hx_redirect(&response, endpoints::ADMIN_DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let mut form = log_in_data("alice@example.com", PASSWORD);
        form.redirect_url = Some("/poll/1".to_owned());

        let response = new_log_in_request(get_test_state(), form).await;

        assert_hx_redirect(&response, "/poll/1");
    }

    #[tokio::test]
    async fn log_in_falls_back_on_invalid_redirect_url() {
        let mut form = log_in_data("alice@example.com", PASSWORD);
        form.redirect_url = Some("https://example.com".to_owned());

        let response = new_log_in_request(get_test_state(), form).await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let response = new_log_in_request(
            get_test_state(),
            log_in_data("alice@example.com", "correct horse battery stapler"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email_and_same_message() {
        let response = new_log_in_request(
            get_test_state(),
            log_in_data("carol@example.com", PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let app = Router::new()
            .route(endpoints::LOG_IN_VIEW, post(post_log_in))
            .with_state(get_test_state());
        let server = TestServer::new(app).expect("Could not create test server.");

        server
            .post(endpoints::LOG_IN_VIEW)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Test helper macro to assert that two date times are within two seconds
    /// of each other.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr$(,)?) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(2),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie_through_form() {
        let app = Router::new()
            .route(endpoints::LOG_IN_VIEW, post(post_log_in))
            .with_state(get_test_state());
        let server = TestServer::new(app).expect("Could not create test server.");
        let form = [
            ("user_email", "alice@example.com"),
            ("user_password", PASSWORD),
            ("remember_me", "on"),
        ];

        let response = server.post(endpoints::LOG_IN_VIEW).form(&form).await;

        response.assert_status_see_other();
        let token_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close!(
            token_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION
        );
    }

    async fn assert_error_message(response: Response<Body>, message: &str) {
        let fragment = parse_html_fragment(response).await;
        let error_selector = scraper::Selector::parse("p.text-red-500.text-base").unwrap();
        let error = fragment
            .select(&error_selector)
            .next()
            .expect("expected error message paragraph");
        let error_text = error.text().collect::<String>();
        assert_eq!(error_text.trim(), message);
    }
}
