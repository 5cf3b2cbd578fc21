// ********* Input data structures ***********

use chrono::{NaiveDate, NaiveDateTime};
use snafu::Snafu;

/// The maximum number of dates a participant may choose.
pub const MAX_DATES: usize = 3;

/// Format of the submission timestamps, in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the dates, both in the persisted table and on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The record of one participant.
///
/// The name is the key of the record: it is matched exactly (case-sensitive,
/// no trimming). A participant has at most one submission at any time.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Submission {
    pub name: String,
    /// Between 0 and [MAX_DATES] distinct dates, in the order they were chosen.
    pub dates: Vec<NaiveDate>,
    /// Time of the most recent write for this name.
    pub submitted_at: NaiveDateTime,
}

impl Submission {
    /// The dates laid out in the fixed slots of the persisted table.
    /// Missing slots are empty, they are never padded with placeholder dates.
    pub fn date_slots(&self) -> [Option<NaiveDate>; MAX_DATES] {
        let mut slots = [None; MAX_DATES];
        for (slot, date) in slots.iter_mut().zip(self.dates.iter()) {
            *slot = Some(*date);
        }
        slots
    }
}

// ******** Output data structures *********

/// The votes for one candidate date.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRecord {
    pub date: NaiveDate,
    pub vote_count: u64,
    /// The participants who voted for this date, in store order.
    pub voters: Vec<String>,
}

impl TallyRecord {
    pub fn empty(date: NaiveDate) -> TallyRecord {
        TallyRecord {
            date,
            vote_count: 0,
            voters: Vec::new(),
        }
    }
}

/// Errors that prevent an operation on the poll from completing.
///
/// Input errors are always raised before anything is written.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    #[snafu(display("A submission needs a non-empty name"))]
    EmptyName {},
    #[snafu(display("At most {max} dates may be chosen, but {count} were given"))]
    TooManyDates { count: usize, max: usize },
    #[snafu(display("The date {date} was chosen more than once"))]
    DuplicateDate { date: NaiveDate },
    #[snafu(display("The date {date} is not a selectable workday"))]
    DateNotSelectable { date: NaiveDate },
    #[snafu(display("{year}-{month:02} is not a valid month"))]
    InvalidMonth { year: i32, month: u32 },
    #[snafu(display("No participant is logged in"))]
    NotLoggedIn {},
    #[snafu(display("Storage failure: {source}"))]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PartialEq for PollError {
    fn eq(&self, other: &PollError) -> bool {
        use PollError::*;
        match (self, other) {
            (EmptyName {}, EmptyName {}) | (NotLoggedIn {}, NotLoggedIn {}) => true,
            (
                TooManyDates { count, max },
                TooManyDates {
                    count: count2,
                    max: max2,
                },
            ) => count == count2 && max == max2,
            (DuplicateDate { date }, DuplicateDate { date: date2 }) => date == date2,
            (DateNotSelectable { date }, DateNotSelectable { date: date2 }) => date == date2,
            (
                InvalidMonth { year, month },
                InvalidMonth {
                    year: year2,
                    month: month2,
                },
            ) => year == year2 && month == month2,
            // Storage failures are compared by their message.
            (Persistence { source }, Persistence { source: source2 }) => {
                source.to_string() == source2.to_string()
            }
            _ => false,
        }
    }
}

impl PollError {
    /// True for the errors caused by the caller's input, as opposed to the storage.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PollError::EmptyName {}
                | PollError::TooManyDates { .. }
                | PollError::DuplicateDate { .. }
                | PollError::DateNotSelectable { .. }
                | PollError::InvalidMonth { .. }
        )
    }

    /// Wraps the failure of a storage backend.
    pub fn persistence<E>(source: E) -> PollError
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        PollError::Persistence {
            source: source.into(),
        }
    }
}
