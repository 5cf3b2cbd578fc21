mod calendar;
mod config;
pub mod manual;
pub mod quick_start;
mod session;
mod store;

use chrono::NaiveDate;
use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::calendar::*;
pub use crate::config::*;
pub use crate::session::*;
pub use crate::store::*;

/// The number of dates shown in the podium of the report.
pub const DEFAULT_TOP_N: usize = 3;

/// Counts the votes for each candidate date.
///
/// Arguments:
/// * `submissions` the submissions to count, in store order
/// * `valid_dates` the candidate dates
///
/// The result holds exactly one record per candidate date, in the order of
/// `valid_dates`, including the dates that nobody chose. Chosen dates that are
/// not candidates (for example after a change of holidays) are not counted.
pub fn compute_tally(submissions: &[Submission], valid_dates: &[NaiveDate]) -> Vec<TallyRecord> {
    info!(
        "compute_tally: processing {} submissions over {} dates",
        submissions.len(),
        valid_dates.len()
    );
    let mut records: Vec<TallyRecord> = valid_dates.iter().map(|d| TallyRecord::empty(*d)).collect();
    let positions: HashMap<NaiveDate, usize> = valid_dates
        .iter()
        .enumerate()
        .map(|(idx, d)| (*d, idx))
        .collect();

    for submission in submissions.iter() {
        // A date counts once per submission, even if a hand-edited table repeats it.
        let mut seen: HashSet<NaiveDate> = HashSet::new();
        for date in submission.dates.iter() {
            if !seen.insert(*date) {
                debug!(
                    "compute_tally: {:?}: skipping repeated date {}",
                    submission.name, date
                );
                continue;
            }
            match positions.get(date) {
                Some(idx) => {
                    let record = &mut records[*idx];
                    record.vote_count += 1;
                    record.voters.push(submission.name.clone());
                }
                None => {
                    debug!(
                        "compute_tally: {:?}: skipping {} (not a candidate date)",
                        submission.name, date
                    );
                }
            }
        }
    }
    records
}

/// The `n` most popular dates, most votes first.
///
/// Dates with the same number of votes keep their calendar order. Dates
/// without any vote are not ranked.
pub fn top_n(tally: &[TallyRecord], n: usize) -> Vec<TallyRecord> {
    let mut ranked: Vec<TallyRecord> = tally.iter().filter(|r| r.vote_count > 0).cloned().collect();
    // Stable sort: ties stay in calendar order.
    ranked.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
    ranked.truncate(n);
    for (idx, r) in ranked.iter().enumerate() {
        debug!("top_n: #{} {} with {} votes", idx + 1, r.date, r.vote_count);
    }
    ranked
}
