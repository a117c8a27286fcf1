//! The dashboard page, listing the polls owned by the signed-in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, link,
    },
    navigation::NavBar,
    poll::{Poll, get_polls_for_user},
    user::{User, UserID, get_user_by_id},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the signed-in user's polls.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let polls = get_polls_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get polls for user {user_id}: {error}"))?;

    Ok(dashboard_view(&user, &polls).into_response())
}

fn polls_table(polls: &[Poll]) -> Markup {
    html! {
        table id="polls" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Poll" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Participants" }
                }
            }

            tbody
            {
                @for poll in polls {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            a
                                href=(format_endpoint(endpoints::POLL_VIEW, poll.id))
                                class=(LINK_STYLE)
                            {
                                (poll.name)
                            }
                        }
                        td class=(TABLE_CELL_STYLE) { (poll.participants.join(", ")) }
                    }
                }
            }
        }
    }
}

fn dashboard_view(user: &User, polls: &[Poll]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, user).into_html();
    let new_poll_url = format_endpoint(endpoints::NEW_POLL_VIEW, user.id.as_i64());
    let edit_user_url = format_endpoint(endpoints::EDIT_USER_VIEW, user.id.as_i64());

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Welcome, " (user.full_name()) }

                @if polls.is_empty() {
                    p { "You have no polls yet. " (link(&new_poll_url, "Create your first poll")) "." }
                } @else {
                    (polls_table(polls))
                    p { (link(&new_poll_url, "Create a poll")) }
                }

                p { (link(&edit_user_url, "Edit your profile")) }
            }
        }
    };

    base("Dashboard", &content)
}
