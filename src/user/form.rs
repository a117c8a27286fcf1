//! The form fields shared by the registration and admin user forms.

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, user::UserDetails};

/// The format of dates of birth in forms, e.g. "1990-04-01".
const DOB_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date of birth in the format "YYYY-MM-DD".
///
/// # Errors
///
/// Returns an [Error::Validation] if `raw_dob` is not a valid date.
pub fn parse_dob(raw_dob: &str) -> Result<Date, Error> {
    Date::parse(raw_dob.trim(), DOB_FORMAT).map_err(|_| {
        Error::Validation(format!(
            "\"{raw_dob}\" is not a valid date of birth, use the format YYYY-MM-DD"
        ))
    })
}

/// Format a date of birth in the same format that [parse_dob] accepts.
pub fn format_dob(dob: Date) -> String {
    dob.format(DOB_FORMAT).unwrap_or_else(|_| dob.to_string())
}

/// The raw personal details entered in a user form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetailsForm {
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub user_dob: String,
    pub user_address: String,
}

impl UserDetailsForm {
    /// Check that every field is filled in and the date of birth is valid.
    ///
    /// Text fields are trimmed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] describing the first invalid field.
    pub fn validate(&self) -> Result<UserDetails, Error> {
        Ok(UserDetails {
            first_name: required("First name", &self.first_name)?,
            last_name: required("Last name", &self.last_name)?,
            email: required("Email", &self.user_email)?,
            phone: required("Phone", &self.user_phone)?,
            dob: parse_dob(&self.user_dob)?,
            address: required("Address", &self.user_address)?,
        })
    }
}

/// Trim `value` and check that it is not empty.
pub(crate) fn required(field_name: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        Err(Error::Validation(format!("{field_name} cannot be empty")))
    } else {
        Ok(value.to_owned())
    }
}

#[cfg(test)]
mod user_details_form_tests {
    use time::macros::date;

    use crate::Error;

    use super::{UserDetailsForm, format_dob, parse_dob};

    fn form() -> UserDetailsForm {
        UserDetailsForm {
            first_name: " Alice ".to_owned(),
            last_name: "Smith".to_owned(),
            user_email: "alice@example.com".to_owned(),
            user_phone: "021 123 4567".to_owned(),
            user_dob: "1990-04-01".to_owned(),
            user_address: "Springfield".to_owned(),
        }
    }

    #[test]
    fn validate_trims_fields() {
        let details = form().validate().unwrap();

        assert_eq!(details.first_name, "Alice");
        assert_eq!(details.dob, date!(1990 - 04 - 01));
    }

    #[test]
    fn validate_rejects_empty_field() {
        let mut form = form();
        form.user_address = "   ".to_owned();

        assert_eq!(
            form.validate(),
            Err(Error::Validation("Address cannot be empty".to_owned()))
        );
    }

    #[test]
    fn parse_dob_rejects_other_formats() {
        assert!(parse_dob("01/04/1990").is_err());
        assert!(parse_dob("1990-02-30").is_err());
        assert_eq!(parse_dob("1990-04-01"), Ok(date!(1990 - 04 - 01)));
    }

    #[test]
    fn format_dob_pads_month_and_day() {
        assert_eq!(format_dob(date!(2001 - 02 - 03)), "2001-02-03");
    }
}
