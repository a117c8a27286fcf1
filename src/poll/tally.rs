//! Running totals for the transactions in a poll.

use crate::poll::TransactionDetail;

/// How much one person has paid and how that compares to their share.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyRow {
    pub name: String,
    /// The sum of the amounts this person paid.
    pub paid: i128,
    /// Paid minus the person's share. Positive means they are owed money.
    pub balance: f64,
    /// False for payers that are not in the poll's participant list.
    pub is_participant: bool,
}

/// The totals for a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    /// Participants in list order followed by any other payers in the order they first paid.
    pub rows: Vec<TallyRow>,
    /// The sum of every transaction in the poll.
    ///
    /// Summed as `i128` so that any number of stored `i64` amounts fits.
    pub total: i128,
    /// The total divided equally between the participants.
    pub share: f64,
}

impl Tally {
    /// Total up `transactions` and split the total equally between `participants`.
    ///
    /// Payers outside `participants` do not take a share, so their balance
    /// is everything they paid. Repeated participant names are counted once.
    pub fn new(participants: &[String], transactions: &[TransactionDetail]) -> Self {
        let mut rows: Vec<TallyRow> = Vec::new();

        for name in participants {
            if !rows.iter().any(|row| &row.name == name) {
                rows.push(TallyRow {
                    name: name.clone(),
                    paid: 0,
                    balance: 0.0,
                    is_participant: true,
                });
            }
        }

        let participant_count = rows.len();
        let mut total = 0;

        for transaction in transactions {
            let amount = i128::from(transaction.amount);
            total += amount;

            match rows.iter_mut().find(|row| row.name == transaction.payer) {
                Some(row) => row.paid += amount,
                None => rows.push(TallyRow {
                    name: transaction.payer.clone(),
                    paid: amount,
                    balance: 0.0,
                    is_participant: false,
                }),
            }
        }

        let share = if participant_count == 0 {
            0.0
        } else {
            total as f64 / participant_count as f64
        };

        for row in &mut rows {
            row.balance = if row.is_participant {
                row.paid as f64 - share
            } else {
                row.paid as f64
            };
        }

        Self { rows, total, share }
    }
}
