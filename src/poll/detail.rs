//! The poll page, which lists a poll's transactions and tally, and the
//! endpoint for adding transactions.

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
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_amount, submit_button,
    },
    navigation::NavBar,
    poll::{
        MAX_AMOUNT, MAX_PURPOSE_LENGTH, Poll, PollId, Tally, TransactionDetail, TransactionFormData,
        create_transaction, get_poll, get_transactions_for_poll,
    },
    user::{User, UserID, get_user_by_id},
};

/// The state needed for the poll page and the add transaction endpoint.
#[derive(Debug, Clone)]
pub struct PollPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PollPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Load the poll and the signed-in user, checking the user may access the poll.
fn get_authorized_poll(
    session_user_id: UserID,
    poll_id: PollId,
    connection: &Connection,
) -> Result<(User, Poll), Error> {
    let session_user = get_user_by_id(session_user_id, connection)?;
    let poll = get_poll(poll_id, connection)?;

    if !session_user.can_manage(poll.user_id) {
        tracing::warn!("User {session_user_id} tried to access poll {poll_id}");
        return Err(Error::Forbidden);
    }

    Ok((session_user, poll))
}

/// Render the page for the poll `poll_id`.
pub async fn get_poll_page(
    State(state): State<PollPageState>,
    Extension(session_user_id): Extension<UserID>,
    Path(poll_id): Path<PollId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (session_user, poll) = get_authorized_poll(session_user_id, poll_id, &connection)?;
    let transactions = get_transactions_for_poll(poll_id, &connection)?;
    let tally = Tally::new(&poll.participants, &transactions);

    Ok(poll_view(&session_user, &poll, &transactions, &tally).into_response())
}

/// Handle the form for adding a transaction to a poll.
///
/// Redirects back to the poll page on success.
pub async fn add_transaction_endpoint(
    State(state): State<PollPageState>,
    Extension(session_user_id): Extension<UserID>,
    Path(poll_id): Path<PollId>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let new_transaction = match form.validate() {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_authorized_poll(session_user_id, poll_id, &connection)
        .and_then(|_| create_transaction(poll_id, new_transaction, &connection));

    match result {
        Ok(transaction) => {
            tracing::info!(
                "User {session_user_id} added transaction {} to poll {poll_id}",
                transaction.id
            );
            (
                HxRedirect(format_endpoint(endpoints::POLL_VIEW, poll_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn participant_count_warning(poll: &Poll) -> Markup {
    html! {
        div
            id="participant-count-warning"
            role="alert"
            class="w-full p-4 mb-4 text-sm text-yellow-800 rounded bg-yellow-50 dark:bg-gray-800 dark:text-yellow-300"
        {
            "This poll was created for " (poll.number_of_persons) " people but lists "
            (poll.participants.len()) " participants."
        }
    }
}

fn transactions_table(transactions: &[TransactionDetail]) -> Markup {
    html! {
        table id="transactions" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Payer" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Purpose" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (transaction.payer) }
                        td class=(TABLE_CELL_STYLE) { (transaction.amount) }
                        td class=(TABLE_CELL_STYLE) { (transaction.purpose) }
                    }
                }

                @if transactions.is_empty() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td colspan="3" class=(TABLE_CELL_STYLE) { "No transactions yet." }
                    }
                }
            }
        }
    }
}

fn tally_table(tally: &Tally) -> Markup {
    html! {
        table id="tally" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Paid" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                }
            }

            tbody
            {
                @for row in &tally.rows {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE)
                        {
                            (row.name)
                            @if !row.is_participant {
                                " (not a participant)"
                            }
                        }
                        td class=(TABLE_CELL_STYLE) { (row.paid) }
                        td class=(TABLE_CELL_STYLE) { (format_amount(row.balance)) }
                    }
                }
            }

            tfoot
            {
                tr class="font-semibold text-gray-900 dark:text-white"
                {
                    th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                    td id="tally-total" class=(TABLE_CELL_STYLE) { (tally.total) }
                    td id="tally-share" class=(TABLE_CELL_STYLE)
                    {
                        (format_amount(tally.share)) " each"
                    }
                }
            }
        }
    }
}

fn add_transaction_form(poll: &Poll) -> Markup {
    let poll_endpoint = format_endpoint(endpoints::POLL_VIEW, poll.id);

    html! {
        form
            hx-post=(poll_endpoint)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full max-w-md space-y-4"
        {
            div
            {
                label for="payer" class=(FORM_LABEL_STYLE) { "Payer" }

                input
                    id="payer"
                    type="text"
                    name="payer"
                    list="participant-names"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id="participant-names"
                {
                    @for name in &poll.participants {
                        option value=(name) {}
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="1"
                    min=(-MAX_AMOUNT)
                    max=(MAX_AMOUNT)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="purpose" class=(FORM_LABEL_STYLE) { "Purpose" }

                input
                    id="purpose"
                    type="text"
                    name="purpose"
                    maxlength=(MAX_PURPOSE_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Add Transaction"))
        }
    }
}

fn poll_view(
    session_user: &User,
    poll: &Poll,
    transactions: &[TransactionDetail],
    tally: &Tally,
) -> Markup {
    let poll_endpoint = format_endpoint(endpoints::POLL_VIEW, poll.id);
    let nav_bar = NavBar::new(&poll_endpoint, session_user).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-6"
            {
                h1 class="text-xl font-bold" { (poll.name) }

                @if poll.has_participant_count_mismatch() {
                    (participant_count_warning(poll))
                }

                section
                {
                    h2 class="text-lg font-semibold mb-2" { "Participants" }

                    ul id="participants" class="list-disc list-inside"
                    {
                        @for name in &poll.participants {
                            li { (name) }
                        }
                    }
                }

                section
                {
                    h2 class="text-lg font-semibold mb-2" { "Transactions" }
                    (transactions_table(transactions))
                }

                section
                {
                    h2 class="text-lg font-semibold mb-2" { "Tally" }
                    (tally_table(tally))
                }

                section
                {
                    h2 class="text-lg font-semibold mb-2" { "Add a transaction" }
                    (add_transaction_form(poll))
                }
            }
        }
    };

    base(&poll.name, &content)
}
