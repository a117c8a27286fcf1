//! Poll creation page and endpoint.

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

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, submit_button,
        text_input,
    },
    navigation::NavBar,
    poll::{Poll, create_poll, domain::PollFormData},
    user::{User, UserID, get_user_by_id},
};

/// The state needed for the new poll page and endpoint.
#[derive(Debug, Clone)]
pub struct CreatePollState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePollState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Load the signed-in user and check they may create polls for `owner_id`.
fn authorize(
    session_user_id: UserID,
    owner_id: UserID,
    connection: &Connection,
) -> Result<User, Error> {
    let session_user = get_user_by_id(session_user_id, connection)?;

    if !session_user.can_manage(owner_id) {
        tracing::warn!("User {session_user_id} tried to create a poll for user {owner_id}");
        return Err(Error::Forbidden);
    }

    Ok(session_user)
}

/// Render the poll creation page for the user `user_id`.
pub async fn get_new_poll_page(
    State(state): State<CreatePollState>,
    Extension(session_user_id): Extension<UserID>,
    Path(user_id): Path<i64>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let owner_id = UserID::new(user_id);
    let session_user = authorize(session_user_id, owner_id, &connection)?;
    let owner = get_user_by_id(owner_id, &connection)?;

    Ok(new_poll_view(&session_user, &owner).into_response())
}

/// Handle poll creation form submission.
pub async fn create_poll_endpoint(
    State(state): State<CreatePollState>,
    Extension(session_user_id): Extension<UserID>,
    Path(user_id): Path<i64>,
    Form(form): Form<PollFormData>,
) -> Response {
    let new_poll = match form.validate() {
        Ok(new_poll) => new_poll,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let owner_id = UserID::new(user_id);
    let result = authorize(session_user_id, owner_id, &connection)
        .and_then(|_| create_poll(owner_id, new_poll, &connection));

    match result {
        Ok(Poll { id, .. }) => {
            tracing::info!("User {session_user_id} created poll {id} for user {owner_id}");
            (
                HxRedirect(format_endpoint(endpoints::POLL_VIEW, id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn new_poll_view(session_user: &User, owner: &User) -> Markup {
    let new_poll_endpoint = format_endpoint(endpoints::NEW_POLL_VIEW, owner.id.as_i64());
    let nav_bar = NavBar::new(&new_poll_endpoint, session_user).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New poll for " (owner.full_name()) }

            form
                hx-post=(new_poll_endpoint)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full max-w-md space-y-4 md:space-y-6"
            {
                (text_input("Poll name", "pollname", "text", "", None))

                div
                {
                    label for="number_of_persons" class=(FORM_LABEL_STYLE) { "Number of persons" }

                    input
                        id="number_of_persons"
                        type="number"
                        name="number_of_persons"
                        min="1"
                        step="1"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (text_input("Participants (comma separated)", "persons", "text", "", None))

                (submit_button("Create Poll"))
            }
        }
    };

    base("New Poll", &content)
}

#[cfg(test)]
mod new_poll_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, get_test_connection, must_get_form, parse_html_document,
        },
        user::test_utils::{insert_user, user_details},
    };

    use super::{CreatePollState, get_new_poll_page};

    fn get_state() -> CreatePollState {
        CreatePollState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    #[tokio::test]
    async fn render_page() {
        let state = get_state();
        let user = insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &state.db_connection.lock().unwrap(),
        );

        let response = get_new_poll_page(State(state), Extension(user.id), Path(user.id.as_i64()))
            .await
            .into_response();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::NEW_POLL_VIEW, user.id.as_i64()),
            "hx-post",
        );
        assert_form_input(&form, "pollname", "text");
        assert_form_input(&form, "number_of_persons", "number");
        assert_form_input(&form, "persons", "text");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn other_users_get_forbidden() {
        let state = get_state();
        let (alice, bob) = {
            let connection = state.db_connection.lock().unwrap();
            (
                insert_user(
                    user_details("Alice", "alice@example.com"),
                    false,
                    "hunter2",
                    &connection,
                ),
                insert_user(
                    user_details("Bob", "bob@example.com"),
                    false,
                    "hunter2",
                    &connection,
                ),
            )
        };

        let response = get_new_poll_page(State(state), Extension(bob.id), Path(alice.id.as_i64()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_gets_not_found_for_missing_user() {
        let state = get_state();
        let admin = insert_user(
            user_details("Admin", "admin@example.com"),
            true,
            "hunter2",
            &state.db_connection.lock().unwrap(),
        );

        let response = get_new_poll_page(State(state), Extension(admin.id), Path(999))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
