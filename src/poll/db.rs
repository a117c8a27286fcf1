//! Database operations for polls and their participants.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, params};

use crate::{
    Error,
    poll::{NewPoll, Poll, PollId},
    user::UserID,
};

/// Create the poll and participant tables.
///
/// Deleting a user deletes their polls, and deleting a poll deletes its participants.
pub fn create_poll_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS poll (
            pollid INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            pollname TEXT NOT NULL,
            number_of_persons INTEGER NOT NULL,
            person_names TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_poll_user_id ON poll(user_id);

        CREATE TABLE IF NOT EXISTS poll_participant (
            poll_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY(poll_id, position),
            FOREIGN KEY(poll_id) REFERENCES poll(pollid) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Save `new_poll` and its participants for the user `owner_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if `owner_id` does not belong to a user.
pub fn create_poll(
    owner_id: UserID,
    new_poll: NewPoll,
    connection: &Connection,
) -> Result<Poll, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "INSERT INTO poll (user_id, pollname, number_of_persons, person_names)
        VALUES (?1, ?2, ?3, ?4)",
        params![
            owner_id.as_i64(),
            new_poll.name,
            new_poll.number_of_persons,
            new_poll.person_names,
        ],
    )?;

    let id = transaction.last_insert_rowid();

    {
        let mut statement = transaction
            .prepare("INSERT INTO poll_participant (poll_id, position, name) VALUES (?1, ?2, ?3)")?;

        for (position, name) in new_poll.participants.iter().enumerate() {
            statement.execute(params![id, position as i64, name])?;
        }
    }

    transaction.commit()?;

    Ok(Poll {
        id,
        user_id: owner_id,
        name: new_poll.name,
        number_of_persons: new_poll.number_of_persons,
        person_names: new_poll.person_names,
        participants: new_poll.participants,
    })
}

/// Retrieve a poll and its participants.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no poll with `poll_id`.
pub fn get_poll(poll_id: PollId, connection: &Connection) -> Result<Poll, Error> {
    let mut poll = connection
        .prepare(
            "SELECT pollid, user_id, pollname, number_of_persons, person_names
            FROM poll WHERE pollid = :id",
        )?
        .query_row(&[(":id", &poll_id)], map_row)?;

    poll.participants = get_participants(poll_id, connection)?;

    Ok(poll)
}

/// Retrieve the polls created by `user_id` in the order they were created.
pub fn get_polls_for_user(user_id: UserID, connection: &Connection) -> Result<Vec<Poll>, Error> {
    let mut polls = connection
        .prepare(
            "SELECT pollid, user_id, pollname, number_of_persons, person_names
            FROM poll WHERE user_id = :user_id ORDER BY pollid ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for poll in &mut polls {
        poll.participants = get_participants(poll.id, connection)?;
    }

    Ok(polls)
}

fn get_participants(poll_id: PollId, connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT name FROM poll_participant WHERE poll_id = :id ORDER BY position ASC")?
        .query_map(&[(":id", &poll_id)], |row| row.get(0))?
        .map(|maybe_name| maybe_name.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Poll, rusqlite::Error> {
    Ok(Poll {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        number_of_persons: row.get(3)?,
        person_names: row.get(4)?,
        participants: Vec::new(),
    })
}
