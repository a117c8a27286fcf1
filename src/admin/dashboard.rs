//! The admin dashboard, listing every user with edit and delete actions.

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
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
    user::{User, format_dob, get_all_users},
};

/// The state needed for the admin dashboard.
#[derive(Debug, Clone)]
pub struct AdminDashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdminDashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display every user in a table.
///
/// `admin` is the signed-in administrator, added to the request by the admin guard.
pub async fn get_admin_dashboard(
    State(state): State<AdminDashboardState>,
    Extension(admin): Extension<User>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let users = get_all_users(&connection)?;

    Ok(admin_dashboard_view(&admin, &users).into_response())
}

fn user_row(admin: &User, user: &User) -> Markup {
    let edit_url = format_endpoint(endpoints::ADMIN_EDIT_USER_VIEW, user.id.as_i64());
    let delete_url = format_endpoint(endpoints::ADMIN_USER, user.id.as_i64());

    html! {
        tr id={ "user-" (user.id.as_i64()) } class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (user.id.as_i64()) }
            td class=(TABLE_CELL_STYLE) { (user.full_name()) }
            td class=(TABLE_CELL_STYLE) { (user.email) }
            td class=(TABLE_CELL_STYLE) { (user.phone) }
            td class=(TABLE_CELL_STYLE) { (format_dob(user.dob)) }
            td class=(TABLE_CELL_STYLE) { (user.address) }
            td class=(TABLE_CELL_STYLE) { @if user.is_admin { "Yes" } @else { "No" } }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                    @if user.id != admin.id {
                        button
                            hx-delete=(delete_url)
                            hx-confirm={ "Are you sure you want to delete " (user.full_name()) "? Their polls will also be deleted." }
                            hx-target="closest tr"
                            hx-swap="outerHTML"
                            hx-target-error="#alert-container"
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}

fn admin_dashboard_view(admin: &User, users: &[User]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADMIN_DASHBOARD_VIEW, admin).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full space-y-6"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-xl font-bold" { "Users" }
                    (link(endpoints::ADMIN_NEW_USER_VIEW, "Create user"))
                }

                div class="relative overflow-x-auto shadow-md sm:rounded-lg"
                {
                    table id="users" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Phone" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date of birth" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Address" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Admin" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for user in users {
                                (user_row(admin, user))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Admin Dashboard", &content)
}
