//! Pages and endpoints for administrators to create, edit and delete users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    endpoints::{self, format_endpoint},
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, password_input,
        submit_button, text_input,
    },
    navigation::NavBar,
    user::{
        User, UserDetails, UserDetailsForm, UserID, create_user, delete_user, format_dob,
        get_user_by_id, update_password, update_user,
    },
};

/// The minimum password length checked by the browser.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

/// The state needed for the admin user pages and endpoints.
#[derive(Debug, Clone)]
pub struct AdminUserState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdminUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The fields of the admin create and edit user forms.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminUserForm {
    #[serde(flatten)]
    pub details: UserDetailsForm,
    /// Required when creating a user. When editing, an empty password keeps the current one.
    #[serde(default)]
    pub user_password: String,
    /// Present when the admin checkbox is ticked.
    pub is_admin: Option<String>,
}

impl AdminUserForm {
    fn is_admin(&self) -> bool {
        self.is_admin.is_some()
    }
}

fn hash_password(raw_password: &str, details: &UserDetails) -> Result<PasswordHash, Error> {
    let password = ValidatedPassword::new(
        raw_password,
        &[
            details.first_name.as_str(),
            details.last_name.as_str(),
            details.email.as_str(),
        ],
    )?;

    PasswordHash::new(password, PasswordHash::DEFAULT_COST)
}

fn admin_dashboard_redirect() -> Response {
    (
        HxRedirect(endpoints::ADMIN_DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Render the form for creating a user.
pub async fn get_new_user_page(Extension(admin): Extension<User>) -> Response {
    new_user_view(&admin).into_response()
}

/// Create a user with the details, password and admin flag in the form.
pub async fn create_user_endpoint(
    State(state): State<AdminUserState>,
    Extension(admin): Extension<User>,
    Form(form): Form<AdminUserForm>,
) -> Response {
    let details = match form.details.validate() {
        Ok(details) => details,
        Err(error) => return error.into_alert_response(),
    };

    let password_hash = match hash_password(&form.user_password, &details) {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_user(details, form.is_admin(), password_hash, &connection) {
        Ok(user) => {
            tracing::info!("Admin {} created user {}", admin.id, user.id);
            admin_dashboard_redirect()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Render the form for editing the user `user_id`.
pub async fn get_admin_edit_user_page(
    State(state): State<AdminUserState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(UserID::new(user_id), &connection)?;

    Ok(edit_user_view(&admin, &user).into_response())
}

/// Overwrite every detail of the user `user_id`, including the admin flag.
///
/// The password is only changed when the form has a non-empty password.
pub async fn update_user_endpoint(
    State(state): State<AdminUserState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i64>,
    Form(form): Form<AdminUserForm>,
) -> Response {
    let details = match form.details.validate() {
        Ok(details) => details,
        Err(error) => return error.into_alert_response(),
    };

    let password_hash = if form.user_password.is_empty() {
        None
    } else {
        match hash_password(&form.user_password, &details) {
            Ok(password_hash) => Some(password_hash),
            Err(error) => return error.into_alert_response(),
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user_id = UserID::new(user_id);
    let result = save_user_changes(
        user_id,
        &details,
        form.is_admin(),
        password_hash.as_ref(),
        &connection,
    );

    match result {
        Ok(()) => {
            tracing::info!("Admin {} updated user {user_id}", admin.id);
            admin_dashboard_redirect()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn save_user_changes(
    user_id: UserID,
    details: &UserDetails,
    is_admin: bool,
    password_hash: Option<&PasswordHash>,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    update_user(user_id, details, is_admin, &transaction)?;

    if let Some(password_hash) = password_hash {
        update_password(user_id, password_hash, &transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Delete the user `user_id` and their polls.
///
/// Administrators cannot delete their own account.
pub async fn delete_user_endpoint(
    State(state): State<AdminUserState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    if user_id == admin.id {
        tracing::warn!("Admin {user_id} tried to delete their own account");
        return Error::CannotDeleteSelf.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("Admin {} deleted user {user_id}", admin.id);
            StatusCode::OK.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn admin_checkbox(checked: bool) -> Markup {
    html! {
        div class="flex items-center gap-2"
        {
            input
                id="is_admin"
                type="checkbox"
                name="is_admin"
                value="true"
                checked[checked]
                class="w-4 h-4 rounded";

            label for="is_admin" class=(FORM_LABEL_STYLE) { "Administrator" }
        }
    }
}

fn new_user_view(admin: &User) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADMIN_NEW_USER_VIEW, admin).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Create user" }

            form
                hx-post=(endpoints::ADMIN_USERS)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
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
                (admin_checkbox(false))

                (submit_button("Create User"))
            }
        }
    };

    base("Create User", &content)
}

fn edit_user_view(admin: &User, user: &User) -> Markup {
    let edit_page = format_endpoint(endpoints::ADMIN_EDIT_USER_VIEW, user.id.as_i64());
    let update_endpoint = format_endpoint(endpoints::ADMIN_USER, user.id.as_i64());
    let nav_bar = NavBar::new(&edit_page, admin).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit " (user.full_name()) }

            form
                hx-put=(update_endpoint)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                div class="grid grid-cols-2 gap-4"
                {
                    (text_input("First name", "first_name", "text", &user.first_name, None))
                    (text_input("Last name", "last_name", "text", &user.last_name, None))
                }

                (text_input("Email", "user_email", "email", &user.email, None))
                (text_input("Phone", "user_phone", "tel", &user.phone, None))
                (text_input("Date of birth", "user_dob", "date", &format_dob(user.dob), None))
                (text_input("Address", "user_address", "text", &user.address, None))

                div
                {
                    label for="user_password" class=(FORM_LABEL_STYLE) { "New password" }

                    input
                        id="user_password"
                        type="password"
                        name="user_password"
                        placeholder="Leave blank to keep the current password"
                        minlength=(PASSWORD_INPUT_MIN_LENGTH)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (admin_checkbox(user.is_admin))

                (submit_button("Save"))
            }
        }
    };

    base("Edit User", &content)
}

#[cfg(test)]
mod admin_user_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Selector;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_form_submit_button,
            assert_hx_endpoint, assert_status_ok, assert_valid_html, get_test_connection,
            must_get_form, parse_html_document,
        },
        user::test_utils::{insert_user, user_details},
    };

    use super::{AdminUserState, get_admin_edit_user_page, get_new_user_page};

    #[tokio::test]
    async fn render_new_user_page() {
        let connection = get_test_connection();
        let admin = insert_user(
            user_details("Admin", "admin@example.com"),
            true,
            "hunter2",
            &connection,
        );

        let response = get_new_user_page(Extension(admin)).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::ADMIN_USERS, "hx-post");
        assert_form_input(&form, "first_name", "text");
        assert_form_input(&form, "user_dob", "date");
        assert_form_input(&form, "user_password", "password");
        assert_form_submit_button(&form);
        assert_eq!(
            form.select(&Selector::parse("input[name=is_admin]").unwrap())
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn render_edit_user_page() {
        let connection = get_test_connection();
        let admin = insert_user(
            user_details("Admin", "admin@example.com"),
            true,
            "hunter2",
            &connection,
        );
        let alice = insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &connection,
        );
        let state = AdminUserState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_admin_edit_user_page(State(state), Extension(admin), Path(alice.id.as_i64()))
                .await
                .into_response();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::ADMIN_USER, alice.id.as_i64()),
            "hx-put",
        );
        assert_form_input_with_value(&form, "first_name", "text", "Alice");
        assert_form_input_with_value(&form, "user_dob", "date", "1990-04-01");
        assert_eq!(
            form.select(&Selector::parse("input[name=is_admin][checked]").unwrap())
                .count(),
            0
        );
    }

    #[tokio::test]
    async fn edit_page_for_missing_user_is_not_found() {
        let connection = get_test_connection();
        let admin = insert_user(
            user_details("Admin", "admin@example.com"),
            true,
            "hunter2",
            &connection,
        );
        let state = AdminUserState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_admin_edit_user_page(State(state), Extension(admin), Path(999))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
