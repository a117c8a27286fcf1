//! The page and endpoint for users editing their own profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, submit_button, text_input},
    navigation::NavBar,
    user::{ProfileUpdate, User, UserID, get_user_by_id, required, update_user_profile},
};

/// The state needed for the edit profile page and endpoint.
#[derive(Debug, Clone)]
pub struct EditUserState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The profile fields submitted by the edit form.
///
/// There is no admin flag here, any extra fields in the request are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct EditUserForm {
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub user_address: String,
}

impl EditUserForm {
    fn validate(&self) -> Result<ProfileUpdate, Error> {
        Ok(ProfileUpdate {
            first_name: required("First name", &self.first_name)?,
            last_name: required("Last name", &self.last_name)?,
            email: required("Email", &self.user_email)?,
            phone: required("Phone", &self.user_phone)?,
            address: required("Address", &self.user_address)?,
        })
    }
}

/// Load the signed-in user and check they may edit the user `target_id`.
fn authorize(
    session_user_id: UserID,
    target_id: UserID,
    connection: &Connection,
) -> Result<User, Error> {
    let session_user = get_user_by_id(session_user_id, connection)?;

    if !session_user.can_manage(target_id) {
        tracing::warn!("User {session_user_id} tried to edit user {target_id}");
        return Err(Error::Forbidden);
    }

    Ok(session_user)
}

/// Render the profile form for the user `user_id`, filled in with their current details.
pub async fn get_edit_user_page(
    State(state): State<EditUserState>,
    Extension(session_user_id): Extension<UserID>,
    Path(user_id): Path<i64>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let target_id = UserID::new(user_id);
    let session_user = authorize(session_user_id, target_id, &connection)?;
    let user = get_user_by_id(target_id, &connection)?;

    Ok(edit_user_view(&session_user, &user).into_response())
}

/// Handle the profile form.
///
/// Redirects admins to the admin dashboard and everyone else to their dashboard.
pub async fn edit_user_endpoint(
    State(state): State<EditUserState>,
    Extension(session_user_id): Extension<UserID>,
    Path(user_id): Path<i64>,
    Form(form): Form<EditUserForm>,
) -> Response {
    let profile = match form.validate() {
        Ok(profile) => profile,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let target_id = UserID::new(user_id);
    let result = authorize(session_user_id, target_id, &connection).and_then(|session_user| {
        update_user_profile(target_id, &profile, &connection).map(|_| session_user)
    });

    match result {
        Ok(session_user) => {
            tracing::info!("User {session_user_id} updated the profile of user {target_id}");
            let redirect_url = if session_user.is_admin {
                endpoints::ADMIN_DASHBOARD_VIEW
            } else {
                endpoints::DASHBOARD_VIEW
            };

            (HxRedirect(redirect_url.to_owned()), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn edit_user_view(session_user: &User, user: &User) -> Markup {
    let edit_endpoint = format_endpoint(endpoints::EDIT_USER_VIEW, user.id.as_i64());
    let nav_bar = NavBar::new(&edit_endpoint, session_user).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit profile" }

            form
                hx-post=(edit_endpoint)
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
                (text_input("Address", "user_address", "text", &user.address, None))

                (submit_button("Save"))
            }
        }
    };

    base("Edit Profile", &content)
}
