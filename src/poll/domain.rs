//! Core poll domain types.

use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

/// Database identifier for a poll.
pub type PollId = i64;

/// A named group of people sharing expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: PollId,
    /// The user who created the poll.
    pub user_id: UserID,
    pub name: String,
    /// The number of people the creator said would take part.
    ///
    /// This is not checked against `participants`.
    pub number_of_persons: i64,
    /// The participant list exactly as it was entered.
    pub person_names: String,
    /// The trimmed participant names in the order they were entered.
    pub participants: Vec<String>,
}

impl Poll {
    /// Whether the declared number of persons differs from the participant list.
    pub fn has_participant_count_mismatch(&self) -> bool {
        self.number_of_persons != self.participants.len() as i64
    }
}

/// A validated poll that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoll {
    pub name: String,
    pub number_of_persons: i64,
    pub person_names: String,
    pub participants: Vec<String>,
}

impl NewPoll {
    /// Validate the fields of a new poll.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `name` is empty or `person_names`
    /// does not contain at least one name.
    pub fn new(name: &str, number_of_persons: i64, person_names: &str) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Poll name cannot be empty".to_owned()));
        }

        let participants = parse_participants(person_names);
        if participants.is_empty() {
            return Err(Error::Validation(
                "Enter at least one participant, separated by commas".to_owned(),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            number_of_persons,
            person_names: person_names.to_owned(),
            participants,
        })
    }
}

/// Split a comma-separated list of names, trimming whitespace and dropping
/// empty entries.
pub fn parse_participants(person_names: &str) -> Vec<String> {
    person_names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Form data for poll creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct PollFormData {
    pub pollname: String,
    pub number_of_persons: String,
    pub persons: String,
}

impl PollFormData {
    /// Parse the form into a [NewPoll].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the number of persons is not an
    /// integer or [NewPoll::new] rejects the other fields.
    pub fn validate(&self) -> Result<NewPoll, Error> {
        let number_of_persons = self.number_of_persons.trim().parse().map_err(|_| {
            Error::Validation(format!(
                "\"{}\" is not a valid number of persons",
                self.number_of_persons
            ))
        })?;

        NewPoll::new(&self.pollname, number_of_persons, &self.persons)
    }
}

#[cfg(test)]
mod poll_domain_tests {
    use crate::Error;

    use super::{NewPoll, PollFormData, parse_participants};

    #[test]
    fn parses_comma_separated_names() {
        assert_eq!(
            parse_participants("Alice, Bob, Carol"),
            vec!["Alice", "Bob", "Carol"]
        );
    }

    #[test]
    fn drops_empty_names() {
        assert_eq!(parse_participants(" Alice,, ,Bob , "), vec!["Alice", "Bob"]);
        assert!(parse_participants(" , ").is_empty());
    }

    #[test]
    fn new_poll_keeps_raw_names() {
        let poll = NewPoll::new(" Trip ", 2, "Alice,Bob ").unwrap();

        assert_eq!(poll.name, "Trip");
        assert_eq!(poll.person_names, "Alice,Bob ");
        assert_eq!(poll.participants, vec!["Alice", "Bob"]);
    }

    #[test]
    fn new_poll_does_not_check_count() {
        let poll = NewPoll::new("Trip", 5, "Alice, Bob").unwrap();

        assert_eq!(poll.number_of_persons, 5);
    }

    #[test]
    fn new_poll_rejects_empty_fields() {
        assert!(matches!(
            NewPoll::new("  ", 1, "Alice"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            NewPoll::new("Trip", 1, ", ,"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn form_rejects_non_integer_count() {
        let form = PollFormData {
            pollname: "Trip".to_owned(),
            number_of_persons: "three".to_owned(),
            persons: "Alice".to_owned(),
        };

        assert!(matches!(form.validate(), Err(Error::Validation(_))));
    }
}
