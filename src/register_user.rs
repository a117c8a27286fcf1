//! The registration page for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
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
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::set_auth_cookie,
    endpoints,
    html::{base, log_in_register, password_input, submit_button, text_input},
    user::{User, UserDetailsForm, create_user},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn registration_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_VIEW)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div class="grid grid-cols-2 gap-4"
            {
                (text_input("First name", "first_name", "text", "", None))
                (text_input("Last name", "last_name", "text", "", None))
            }

            (text_input("Email", "user_email", "email", "", None))
            (text_input("Phone", "user_phone", "tel", "", None))
            (text_input("Date of birth", "user_dob", "date", "", None))
            (text_input("Address", "user_address", "text", "", None))
            (password_input("user_password", PASSWORD_INPUT_MIN_LENGTH, None))

            (submit_button("Create Account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form();
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(flatten)]
    pub details: UserDetailsForm,
    pub user_password: String,
}

/// Validate the form, hash the password and save the new user.
fn create_user_from_form(form: &RegisterForm, connection: &Connection) -> Result<User, Error> {
    let details = form.details.validate()?;
    let password = ValidatedPassword::new(
        &form.user_password,
        &[
            details.first_name.as_str(),
            details.last_name.as_str(),
            details.email.as_str(),
        ],
    )?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    create_user(details, false, password_hash, connection)
}

/// Handler for registration requests.
///
/// On success the new user is signed in and redirected to their dashboard.
/// Invalid input and duplicate emails are returned as alerts.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => create_user_from_form(&form, &connection),
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(error) => return error.into_alert_response(),
    };

    tracing::info!("Registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            internal_error_redirect()
        }
    }
}

fn internal_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{TestResponse, TestServer};

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        endpoints,
        test_utils::{get_header, get_test_connection},
        user::{
            get_user_by_email,
            test_utils::{insert_user, user_details},
        },
    };

    use super::{RegistrationState, internal_error_redirect, register_user};

    const STRONG_PASSWORD: &str = "iamtestingwhethericancreateanewuser";

    fn get_test_state() -> RegistrationState {
        RegistrationState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    async fn post_form(
        state: RegistrationState,
        email: &str,
        dob: &str,
        password: &str,
    ) -> TestResponse {
        let app = Router::new()
            .route(endpoints::REGISTER_VIEW, post(register_user))
            .with_state(state);
        let server = TestServer::new(app).expect("Could not create test server.");

        server
            .post(endpoints::REGISTER_VIEW)
            .form(&[
                ("first_name", "Alice"),
                ("last_name", "Smith"),
                ("user_email", email),
                ("user_phone", "021 123 4567"),
                ("user_dob", dob),
                ("user_address", "Springfield"),
                ("user_password", password),
            ])
            .await
    }

    #[tokio::test]
    async fn register_user_succeeds() {
        let state = get_test_state();

        let response = post_form(
            state.clone(),
            "alice@example.com",
            "1990-04-01",
            STRONG_PASSWORD,
        )
        .await;

        response.assert_status_see_other();
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        let _ = response.cookie(COOKIE_TOKEN);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("alice@example.com", &connection).unwrap();
        assert!(!user.is_admin);
        assert!(user.check_password(STRONG_PASSWORD));
        assert_ne!(user.password_hash.as_ref(), STRONG_PASSWORD);
    }

    #[tokio::test]
    async fn register_user_fails_with_duplicate_email() {
        let state = get_test_state();
        insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &state.db_connection.lock().unwrap(),
        );

        let response = post_form(state, "alice@example.com", "1990-04-01", STRONG_PASSWORD).await;

        response.assert_status(StatusCode::CONFLICT);
        response.assert_text_contains("Email already registered");
    }

    #[tokio::test]
    async fn register_user_fails_with_weak_password() {
        let response = post_form(get_test_state(), "alice@example.com", "1990-04-01", "foo").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_text_contains("Invalid input");
    }

    #[tokio::test]
    async fn register_user_fails_with_invalid_date_of_birth() {
        let response = post_form(
            get_test_state(),
            "alice@example.com",
            "01/04/1990",
            STRONG_PASSWORD,
        )
        .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_text_contains("YYYY-MM-DD");
    }

    #[test]
    fn cookie_failure_redirects_to_internal_error_page() {
        let response = internal_error_redirect();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            get_header(&response, "hx-redirect"),
            endpoints::INTERNAL_ERROR_VIEW
        );
    }
}
