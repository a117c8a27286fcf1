//! Polls: named groups of people sharing expenses, the payments they make
//! and the running tally of who owes what.

mod create;
mod db;
mod detail;
mod domain;
mod tally;
mod transaction;

pub use create::{create_poll_endpoint, get_new_poll_page};
pub use db::{create_poll, create_poll_tables, get_poll, get_polls_for_user};
pub use detail::{add_transaction_endpoint, get_poll_page};
pub use domain::{NewPoll, Poll, PollId, parse_participants};
pub use tally::{Tally, TallyRow};
pub use transaction::{
    MAX_AMOUNT, MAX_PURPOSE_LENGTH, NewTransaction, TransactionDetail, TransactionFormData,
    TransactionId, create_transaction, create_transaction_table, get_transactions_for_poll,
};
