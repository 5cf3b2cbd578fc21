use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use snafu::prelude::*;

use crate::calendar::WorkdayCalendar;
use crate::config::*;
use crate::store::{Storage, SubmissionStore};

/// What happened to a date after a toggle.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// [MAX_DATES] dates are already selected, the date was not added.
    SelectionFull,
    /// Weekends, holidays and dates outside of the month cannot be selected.
    NotSelectable,
}

/// The state of one participant's interaction with the poll.
///
/// Sessions are values: every step takes the session and returns the
/// updated one.
///
/// ```
/// use chrono::NaiveDate;
/// use date_poll::*;
///
/// let calendar = WorkdayCalendar::new(2026, 1, &[])?;
/// let store = SubmissionStore::new(MemoryStorage::new(), calendar.clone());
///
/// let session = Session::new().login("Anna", &store)?;
/// let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
/// let (session, outcome) = session.toggle(monday, &calendar);
/// assert_eq!(outcome, ToggleOutcome::Added);
///
/// let now = monday.and_hms_opt(12, 0, 0).unwrap();
/// let session = session.submit(&store, now)?;
/// assert!(session.is_submitted());
/// # Ok::<(), PollError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Session {
    user_name: Option<String>,
    selected: Vec<NaiveDate>,
    submitted: bool,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    /// Starts the session of a participant.
    ///
    /// The previous submission of this participant, if any, becomes the
    /// current selection so that it can be modified.
    pub fn login<S: Storage>(
        self,
        name: &str,
        store: &SubmissionStore<S>,
    ) -> Result<Session, PollError> {
        ensure!(!name.is_empty(), EmptyNameSnafu {});
        let selected = match store.get(name) {
            Ok(Some(previous)) => {
                info!(
                    "Welcome back {:?}, loaded the previous selection {:?}",
                    name, previous.dates
                );
                previous.dates
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("login: could not load the selection of {:?}: {}", name, e);
                Vec::new()
            }
        };
        Ok(Session {
            user_name: Some(name.to_string()),
            selected,
            submitted: false,
        })
    }

    /// Removes the date if it is selected, adds it otherwise.
    pub fn toggle(self, date: NaiveDate, calendar: &WorkdayCalendar) -> (Session, ToggleOutcome) {
        let mut selected = self.selected;
        let outcome = if let Some(pos) = selected.iter().position(|d| *d == date) {
            selected.remove(pos);
            ToggleOutcome::Removed
        } else if !calendar.is_workday(&date) {
            ToggleOutcome::NotSelectable
        } else if selected.len() >= MAX_DATES {
            warn!("toggle: only {} dates can be selected", MAX_DATES);
            ToggleOutcome::SelectionFull
        } else {
            selected.push(date);
            ToggleOutcome::Added
        };
        debug!("toggle: {} -> {:?}, selection: {:?}", date, outcome, selected);
        (
            Session {
                user_name: self.user_name,
                selected,
                submitted: self.submitted,
            },
            outcome,
        )
    }

    /// Replaces the whole selection. The store validates it on submit.
    pub fn select(self, dates: &[NaiveDate]) -> Session {
        Session {
            user_name: self.user_name,
            selected: dates.to_vec(),
            submitted: self.submitted,
        }
    }

    /// Saves the current selection for the logged-in participant.
    pub fn submit<S: Storage>(
        self,
        store: &SubmissionStore<S>,
        now: NaiveDateTime,
    ) -> Result<Session, PollError> {
        let name = self.user_name.as_deref().context(NotLoggedInSnafu {})?;
        store.upsert(name, &self.selected, now)?;
        Ok(Session {
            submitted: true,
            ..self
        })
    }

    /// Goes back to editing a submitted selection.
    pub fn edit(self) -> Session {
        Session {
            submitted: false,
            ..self
        }
    }

    pub fn logout(self) -> Session {
        Session::new()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn selected(&self) -> &[NaiveDate] {
        &self.selected
    }

    /// The selection in calendar order.
    pub fn sorted_selection(&self) -> Vec<NaiveDate> {
        let mut dates = self.selected.clone();
        dates.sort();
        dates
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        day(1).and_hms_opt(8, 30, 0).unwrap()
    }

    fn setup() -> (WorkdayCalendar, SubmissionStore<MemoryStorage>) {
        let cal = WorkdayCalendar::new(2026, 1, &[day(1), day(2)]).unwrap();
        let store = SubmissionStore::new(MemoryStorage::new(), cal.clone());
        (cal, store)
    }

    #[test]
    fn toggle_caps_the_selection() {
        let (cal, store) = setup();
        let s = Session::new().login("Alice", &store).unwrap();
        let (s, o1) = s.toggle(day(5), &cal);
        let (s, o2) = s.toggle(day(6), &cal);
        let (s, o3) = s.toggle(day(7), &cal);
        let (s, o4) = s.toggle(day(8), &cal);
        assert_eq!(
            vec![o1, o2, o3, o4],
            vec![
                ToggleOutcome::Added,
                ToggleOutcome::Added,
                ToggleOutcome::Added,
                ToggleOutcome::SelectionFull
            ]
        );
        assert_eq!(s.selected(), &[day(5), day(6), day(7)]);
        let (s, o5) = s.toggle(day(6), &cal);
        assert_eq!(o5, ToggleOutcome::Removed);
        let (s, o6) = s.toggle(day(8), &cal);
        assert_eq!(o6, ToggleOutcome::Added);
        assert_eq!(s.selected(), &[day(5), day(7), day(8)]);
    }

    #[test]
    fn weekends_and_holidays_cannot_be_toggled() {
        let (cal, _store) = setup();
        let (s, o1) = Session::new().toggle(day(2), &cal);
        let (s, o2) = s.toggle(day(10), &cal);
        assert_eq!(o1, ToggleOutcome::NotSelectable);
        assert_eq!(o2, ToggleOutcome::NotSelectable);
        assert!(s.selected().is_empty());
    }

    #[test]
    fn login_loads_previous_selection() {
        let (cal, store) = setup();
        store.upsert("Alice", &[day(9), day(5)], now()).unwrap();
        let s = Session::new().login("Alice", &store).unwrap();
        assert_eq!(s.user_name(), Some("Alice"));
        assert_eq!(s.selected(), &[day(9), day(5)]);
        assert_eq!(s.sorted_selection(), vec![day(5), day(9)]);

        let (s, _) = s.toggle(day(9), &cal);
        let s = s.submit(&store, now()).unwrap();
        assert!(s.is_submitted());
        assert_eq!(store.get("Alice").unwrap().unwrap().dates, vec![day(5)]);

        let s = s.edit();
        assert!(!s.is_submitted());
        let s = s.logout();
        assert_eq!(s, Session::new());
    }

    #[test]
    fn submit_requires_login() {
        let (_cal, store) = setup();
        let s = Session::new().select(&[day(5)]);
        assert_eq!(s.submit(&store, now()), Err(PollError::NotLoggedIn {}));
        assert_eq!(
            Session::new().login("", &store),
            Err(PollError::EmptyName {})
        );
    }

    #[test]
    fn select_is_validated_by_the_store() {
        let (_cal, store) = setup();
        let s = Session::new()
            .login("Bob", &store)
            .unwrap()
            .select(&[day(5), day(6), day(7), day(8)]);
        let res = s.submit(&store, now());
        assert_eq!(res, Err(PollError::TooManyDates { count: 4, max: 3 }));
        assert_eq!(store.get("Bob").unwrap(), None);
    }
}
