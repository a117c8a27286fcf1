//! Code for creating the user table and reading and writing users in the database.

use std::fmt::Display;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, PasswordHash, ValidatedPassword};

mod edit;
mod form;

pub use edit::{edit_user_endpoint, get_edit_user_page};
pub(crate) use form::{UserDetailsForm, format_dob, required};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The personal details that identify a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDetails {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address the user logs in with. Unique across all users.
    pub email: String,
    /// The user's phone number, stored as entered.
    pub phone: String,
    /// The user's date of birth.
    pub dob: Date,
    /// The user's postal address.
    pub address: String,
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's phone number.
    pub phone: String,
    /// The user's date of birth.
    pub dob: Date,
    /// The user's postal address.
    pub address: String,
    /// Whether the user can manage other users.
    pub is_admin: bool,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// The user's first and last name separated by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Hash `password` with `cost` and replace the stored password hash.
    ///
    /// This only changes the user in memory, use [update_password] to save it.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if the password could not be hashed.
    pub fn set_password(&mut self, password: ValidatedPassword, cost: u32) -> Result<(), Error> {
        self.password_hash = PasswordHash::new(password, cost)?;

        Ok(())
    }

    /// Whether `raw_password` matches the user's password hash.
    ///
    /// A hash that cannot be verified is logged and treated as a mismatch.
    pub fn check_password(&self, raw_password: &str) -> bool {
        match self.password_hash.verify(raw_password) {
            Ok(is_match) => is_match,
            Err(error) => {
                tracing::error!("Could not verify password for user {}: {error}", self.id);
                false
            }
        }
    }

    /// Whether the user may view and change data owned by `owner_id`.
    ///
    /// Users may manage their own data and admins may manage anyone's.
    pub fn can_manage(&self, owner_id: UserID) -> bool {
        self.is_admin || self.id == owner_id
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                dob TEXT NOT NULL,
                address TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, dob, address, is_admin, password_hash";

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(8)?;
    let is_admin: i64 = row.get(7)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        dob: row.get(5)?,
        address: row.get(6)?,
        is_admin: is_admin != 0,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if another user already has the same email.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    details: UserDetails,
    is_admin: bool,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (first_name, last_name, email, phone, dob, address, is_admin, password_hash)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            details.first_name,
            details.last_name,
            details.email,
            details.phone,
            details.dob,
            details.address,
            is_admin,
            password_hash.as_ref(),
        ],
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        first_name: details.first_name,
        last_name: details.last_name,
        email: details.email,
        phone: details.phone,
        dob: details.dob,
        address: details.address,
        is_admin,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// The lookup uses the unique index on the email column and is case-sensitive.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no user has the email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &email)], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get every user ordered by ID.
pub fn get_all_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user ORDER BY id ASC"))?
        .query_map([], map_row_to_user)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

/// Get the users whose first name and address equal `first_name` and
/// `address`, ignoring case.
///
/// Both sides are lowercased with [str::to_lowercase] so that non-ASCII
/// letters match regardless of case too.
pub fn search_users(
    first_name: &str,
    address: &str,
    connection: &Connection,
) -> Result<Vec<User>, Error> {
    let first_name = first_name.to_lowercase();
    let address = address.to_lowercase();

    let users = get_all_users(connection)?
        .into_iter()
        .filter(|user| {
            user.first_name.to_lowercase() == first_name && user.address.to_lowercase() == address
        })
        .collect();

    Ok(users)
}

/// The fields a user may change on their own profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Overwrite the profile fields of the user with `user_id`.
///
/// The admin flag, date of birth and password are left unchanged.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist, or an
/// [Error::DuplicateEmail] if the new email belongs to another user.
pub fn update_user_profile(
    user_id: UserID,
    profile: &ProfileUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, address = ?5
        WHERE id = ?6",
        params![
            profile.first_name,
            profile.last_name,
            profile.email,
            profile.phone,
            profile.address,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Overwrite every detail of the user with `user_id` and set the admin flag.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist, or an
/// [Error::DuplicateEmail] if the new email belongs to another user.
pub fn update_user(
    user_id: UserID,
    details: &UserDetails,
    is_admin: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, dob = ?5,
        address = ?6, is_admin = ?7
        WHERE id = ?8",
        params![
            details.first_name,
            details.last_name,
            details.email,
            details.phone,
            details.dob,
            details.address,
            is_admin,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Save a new password hash for the user with `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password_hash = ?1 WHERE id = ?2",
        params![password_hash.as_ref(), user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Grant or revoke administrator rights for the user with `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn set_admin_flag(user_id: UserID, is_admin: bool, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET is_admin = ?1 WHERE id = ?2",
        params![is_admin, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the user with `user_id` along with their polls.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM user WHERE id = ?1", params![user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
