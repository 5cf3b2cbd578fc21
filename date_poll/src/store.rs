use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use snafu::prelude::*;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::calendar::WorkdayCalendar;
use crate::config::*;
use crate::compute_tally;

/// Where the submissions are persisted.
///
/// Implementations replace the whole collection on every save: a failed save
/// must leave the previously saved collection untouched.
pub trait Storage {
    /// All the persisted submissions, in persisted order. Nothing persisted
    /// yet is an empty collection, not an error.
    fn load(&self) -> Result<Vec<Submission>, PollError>;

    fn save(&self, submissions: &[Submission]) -> Result<(), PollError>;

    fn clear(&self) -> Result<(), PollError> {
        self.save(&[])
    }
}

/// A storage that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    rows: Mutex<Vec<Submission>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Vec<Submission>, PollError> {
        let rows = self.rows.lock().map_err(|e| PollError::persistence(e.to_string()))?;
        Ok(rows.clone())
    }

    fn save(&self, submissions: &[Submission]) -> Result<(), PollError> {
        let mut rows = self.rows.lock().map_err(|e| PollError::persistence(e.to_string()))?;
        *rows = submissions.to_vec();
        Ok(())
    }
}

/// The submissions of a poll, keyed by participant name.
///
/// Every write reads the whole collection, changes it and saves it back.
/// Within one process, these sequences are serialized by a lock. Across
/// processes, the last write wins.
pub struct SubmissionStore<S: Storage> {
    storage: S,
    calendar: WorkdayCalendar,
    lock: Mutex<()>,
}

impl<S: Storage> SubmissionStore<S> {
    pub fn new(storage: S, calendar: WorkdayCalendar) -> SubmissionStore<S> {
        SubmissionStore {
            storage,
            calendar,
            lock: Mutex::new(()),
        }
    }

    pub fn calendar(&self) -> &WorkdayCalendar {
        &self.calendar
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Checks a submission against the workday policy, without touching the storage.
    pub fn validate(&self, name: &str, dates: &[NaiveDate]) -> Result<(), PollError> {
        ensure!(!name.is_empty(), EmptyNameSnafu {});
        ensure!(
            dates.len() <= MAX_DATES,
            TooManyDatesSnafu {
                count: dates.len(),
                max: MAX_DATES
            }
        );
        let mut seen: HashSet<NaiveDate> = HashSet::new();
        for date in dates.iter() {
            ensure!(seen.insert(*date), DuplicateDateSnafu { date: *date });
            ensure!(
                self.calendar.is_workday(date),
                DateNotSelectableSnafu { date: *date }
            );
        }
        Ok(())
    }

    /// Inserts the submission of a participant, or fully replaces the
    /// previous one with the same name.
    pub fn upsert(
        &self,
        name: &str,
        dates: &[NaiveDate],
        now: NaiveDateTime,
    ) -> Result<Submission, PollError> {
        self.validate(name, dates)?;
        let submission = Submission {
            name: name.to_string(),
            dates: dates.to_vec(),
            submitted_at: now,
        };

        let _guard = self.guard()?;
        let mut rows = self.storage.load()?;
        let previous = rows.len();
        rows.retain(|s| s.name != name);
        if rows.len() < previous {
            debug!("upsert: replacing the submission of {:?}", name);
        }
        rows.push(submission.clone());
        self.storage.save(&rows)?;
        info!(
            "upsert: saved {:?} with dates {:?} at {}",
            name,
            dates,
            now.format(TIMESTAMP_FORMAT)
        );
        Ok(submission)
    }

    /// The submission of a participant, if any.
    pub fn get(&self, name: &str) -> Result<Option<Submission>, PollError> {
        let _guard = self.guard()?;
        let rows = self.storage.load()?;
        // A hand-edited table may hold the same name twice: the last row is the latest.
        Ok(rows.into_iter().filter(|s| s.name == name).last())
    }

    /// Removes the submissions of the given participants and returns how many
    /// were removed. Unknown names are ignored.
    pub fn delete(&self, names: &[String]) -> Result<usize, PollError> {
        let names: HashSet<&str> = names.iter().map(|n| n.as_str()).collect();
        let _guard = self.guard()?;
        let mut rows = self.storage.load()?;
        let previous = rows.len();
        rows.retain(|s| !names.contains(s.name.as_str()));
        let removed = previous - rows.len();
        if removed > 0 {
            self.storage.save(&rows)?;
        }
        info!("delete: removed {} submission(s) for {:?}", removed, names);
        Ok(removed)
    }

    /// Removes every submission.
    pub fn clear_all(&self) -> Result<(), PollError> {
        let _guard = self.guard()?;
        self.storage.clear()?;
        warn!("clear_all: all the submissions have been removed");
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<Submission>, PollError> {
        let _guard = self.guard()?;
        self.storage.load()
    }

    /// The votes for every candidate date of the calendar.
    ///
    /// If the storage cannot be read, the tally is computed as if nobody had
    /// voted yet.
    pub fn tally(&self) -> Vec<TallyRecord> {
        let submissions = match self.list_all() {
            Ok(rows) => rows,
            Err(e) => {
                warn!("tally: could not read the submissions, assuming none: {}", e);
                Vec::new()
            }
        };
        compute_tally(&submissions, &self.calendar.valid_dates())
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, PollError> {
        self.lock.lock().map_err(|e| PollError::persistence(e.to_string()))
    }
}
