use chrono::{Datelike, NaiveDate};
use log::debug;
use snafu::prelude::*;
use std::collections::HashSet;

use crate::config::*;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The candidate dates of a month: all the days from Monday to Friday that
/// are not holidays, in ascending order.
///
/// An invalid month yields no dates.
///
/// ```
/// use chrono::NaiveDate;
/// use date_poll::valid_dates;
///
/// let new_year = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let dates = valid_dates(2026, 1, &[new_year]);
/// assert_eq!(dates.first(), NaiveDate::from_ymd_opt(2026, 1, 2).as_ref());
/// assert_eq!(dates.len(), 21);
/// ```
pub fn valid_dates(year: i32, month: u32, holidays: &[NaiveDate]) -> Vec<NaiveDate> {
    let holidays: HashSet<NaiveDate> = holidays.iter().cloned().collect();
    month_days(year, month)
        .into_iter()
        .filter(|d| is_weekday(d) && !holidays.contains(d))
        .collect()
}

// Every day of the month, once, in order.
fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = Vec::new();
    let mut current = NaiveDate::from_ymd_opt(year, month, 1);
    while let Some(day) = current {
        if day.month() != month {
            break;
        }
        days.push(day);
        current = day.succ_opt();
    }
    days
}

fn is_weekday(date: &NaiveDate) -> bool {
    date.weekday().number_from_monday() <= 5
}

/// The workday policy of a poll: the target month and its holidays.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WorkdayCalendar {
    year: i32,
    month: u32,
    holidays: Vec<NaiveDate>,
}

impl WorkdayCalendar {
    pub fn new(year: i32, month: u32, holidays: &[NaiveDate]) -> Result<WorkdayCalendar, PollError> {
        ensure!(
            NaiveDate::from_ymd_opt(year, month, 1).is_some(),
            InvalidMonthSnafu { year, month }
        );
        let outside: Vec<&NaiveDate> = holidays
            .iter()
            .filter(|d| d.year() != year || d.month() != month)
            .collect();
        if !outside.is_empty() {
            debug!(
                "WorkdayCalendar::new: holidays outside of {}-{:02} have no effect: {:?}",
                year, month, outside
            );
        }
        Ok(WorkdayCalendar {
            year,
            month,
            holidays: holidays.to_vec(),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn valid_dates(&self) -> Vec<NaiveDate> {
        valid_dates(self.year, self.month, &self.holidays)
    }

    /// True if the date belongs to the target month and can be chosen.
    pub fn is_workday(&self, date: &NaiveDate) -> bool {
        date.year() == self.year
            && date.month() == self.month
            && is_weekday(date)
            && !self.holidays.contains(date)
    }
}
