//! Payments recorded against a poll.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, poll::PollId};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// The maximum number of characters in a transaction's purpose.
pub const MAX_PURPOSE_LENGTH: usize = 120;

/// The largest amount, positive or negative, a single transaction can record.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// A payment made by one person within a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetail {
    pub id: TransactionId,
    pub poll_id: PollId,
    /// The name of the person who paid, expected to be one of the poll's participants.
    pub payer: String,
    /// The amount paid in whole currency units.
    pub amount: i64,
    /// What the payment was for.
    pub purpose: String,
}

/// A validated transaction that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub payer: String,
    pub amount: i64,
    pub purpose: String,
}

impl NewTransaction {
    /// Validate the fields of a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `payer` is empty, `amount` is
    /// further from zero than [MAX_AMOUNT] or `purpose` is longer than
    /// [MAX_PURPOSE_LENGTH] characters.
    pub fn new(payer: &str, amount: i64, purpose: &str) -> Result<Self, Error> {
        let payer = payer.trim();
        if payer.is_empty() {
            return Err(Error::Validation("Payer cannot be empty".to_owned()));
        }

        if !(-MAX_AMOUNT..=MAX_AMOUNT).contains(&amount) {
            return Err(Error::Validation(format!(
                "Amount must be between -{MAX_AMOUNT} and {MAX_AMOUNT}"
            )));
        }

        let purpose = purpose.trim();
        if purpose.chars().count() > MAX_PURPOSE_LENGTH {
            return Err(Error::Validation(format!(
                "Purpose must be at most {MAX_PURPOSE_LENGTH} characters"
            )));
        }

        Ok(Self {
            payer: payer.to_owned(),
            amount,
            purpose: purpose.to_owned(),
        })
    }
}

/// Form data for adding a transaction to a poll.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionFormData {
    pub payer: String,
    pub amount: String,
    #[serde(default)]
    pub purpose: String,
}

impl TransactionFormData {
    /// Parse the form into a [NewTransaction].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the amount is not an integer or
    /// [NewTransaction::new] rejects the other fields.
    pub fn validate(&self) -> Result<NewTransaction, Error> {
        let amount = self.amount.trim().parse().map_err(|_| {
            Error::Validation(format!(
                "\"{}\" is not a valid amount, enter a whole number",
                self.amount
            ))
        })?;

        NewTransaction::new(&self.payer, amount, &self.purpose)
    }
}

/// Create the transaction table.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_detail (
            transaction_id INTEGER PRIMARY KEY,
            poll_id INTEGER NOT NULL,
            payer TEXT NOT NULL,
            amount INTEGER NOT NULL,
            purpose TEXT NOT NULL CHECK (length(purpose) <= 120),
            FOREIGN KEY(poll_id) REFERENCES poll(pollid) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_detail_poll_id ON transaction_detail(poll_id);",
    )?;

    Ok(())
}

/// Save `new_transaction` against the poll `poll_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no poll with `poll_id`.
pub fn create_transaction(
    poll_id: PollId,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<TransactionDetail, Error> {
    connection.execute(
        "INSERT INTO transaction_detail (poll_id, payer, amount, purpose) VALUES (?1, ?2, ?3, ?4)",
        params![
            poll_id,
            new_transaction.payer,
            new_transaction.amount,
            new_transaction.purpose,
        ],
    )?;

    Ok(TransactionDetail {
        id: connection.last_insert_rowid(),
        poll_id,
        payer: new_transaction.payer,
        amount: new_transaction.amount,
        purpose: new_transaction.purpose,
    })
}

/// Retrieve the transactions for `poll_id` in the order they were recorded.
pub fn get_transactions_for_poll(
    poll_id: PollId,
    connection: &Connection,
) -> Result<Vec<TransactionDetail>, Error> {
    connection
        .prepare(
            "SELECT transaction_id, poll_id, payer, amount, purpose
            FROM transaction_detail WHERE poll_id = :poll_id ORDER BY transaction_id ASC",
        )?
        .query_map(&[(":poll_id", &poll_id)], map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<TransactionDetail, rusqlite::Error> {
    Ok(TransactionDetail {
        id: row.get(0)?,
        poll_id: row.get(1)?,
        payer: row.get(2)?,
        amount: row.get(3)?,
        purpose: row.get(4)?,
    })
}

#[cfg(test)]
mod new_transaction_tests {
    use crate::Error;

    use super::{MAX_AMOUNT, MAX_PURPOSE_LENGTH, NewTransaction, TransactionFormData};

    #[test]
    fn rejects_empty_payer() {
        assert!(matches!(
            NewTransaction::new(" ", 10, "lunch"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn purpose_length_is_counted_in_characters() {
        let longest = "é".repeat(MAX_PURPOSE_LENGTH);
        let too_long = "a".repeat(MAX_PURPOSE_LENGTH + 1);

        assert!(NewTransaction::new("Alice", 10, &longest).is_ok());
        assert!(matches!(
            NewTransaction::new("Alice", 10, &too_long),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn amount_must_be_within_limit() {
        assert!(NewTransaction::new("Alice", MAX_AMOUNT, "flat").is_ok());
        assert!(NewTransaction::new("Alice", -MAX_AMOUNT, "refund").is_ok());
        assert!(matches!(
            NewTransaction::new("Alice", MAX_AMOUNT + 1, "flat"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            NewTransaction::new("Alice", i64::MIN, "refund"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn form_rejects_decimal_amount() {
        let form = TransactionFormData {
            payer: "Alice".to_owned(),
            amount: "12.50".to_owned(),
            purpose: "lunch".to_owned(),
        };

        assert!(matches!(form.validate(), Err(Error::Validation(_))));
    }
}

#[cfg(test)]
mod transaction_query_tests {
    use crate::{
        Error,
        poll::{NewPoll, create_poll},
        test_utils::get_test_connection,
        user::test_utils::{insert_user, user_details},
    };

    use super::{NewTransaction, create_transaction, get_transactions_for_poll};

    #[test]
    fn transactions_are_listed_in_insertion_order() {
        let connection = get_test_connection();
        let user = insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &connection,
        );
        let poll = create_poll(
            user.id,
            NewPoll::new("Trip", 2, "Alice, Bob").unwrap(),
            &connection,
        )
        .unwrap();

        let dinner = create_transaction(
            poll.id,
            NewTransaction::new("Alice", 50, "dinner").unwrap(),
            &connection,
        )
        .unwrap();
        let taxi = create_transaction(
            poll.id,
            NewTransaction::new("Bob", 20, "taxi").unwrap(),
            &connection,
        )
        .unwrap();

        let got = get_transactions_for_poll(poll.id, &connection).unwrap();

        assert_eq!(got, vec![dinner, taxi]);
        assert_eq!(got[0].payer, "Alice");
        assert_eq!(got[0].amount, 50);
        assert_eq!(got[0].purpose, "dinner");
    }

    #[test]
    fn create_transaction_fails_for_missing_poll() {
        let connection = get_test_connection();

        let result = create_transaction(
            1,
            NewTransaction::new("Alice", 50, "dinner").unwrap(),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
