use log::{debug, info, warn};

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use date_poll::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
pub mod io_csv;

use crate::args::{AdminAction, Args, Command};
use crate::poll::config_reader::*;
use crate::poll::io_common::{format_date, format_timestamp, parse_date, parse_dates, weekday_name};
use crate::poll::io_csv::CsvStorage;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DpollError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("The CSV file {path} has no column {column:?}"))]
    CsvMissingColumn { path: String, column: String },
    #[snafu(display("Error writing CSV to {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Cannot read the date {value:?} (expected YYYY-MM-DD)"))]
    InvalidDate {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("Cannot read the timestamp {value:?} on line {lineno}"))]
    InvalidTimestamp {
        source: chrono::ParseError,
        value: String,
        lineno: usize,
    },
    #[snafu(display("Wrong administration password"))]
    WrongPassword {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Difference detected between the report and the reference report"))]
    ReferenceMismatch {},
    #[snafu(display("{source}"))]
    Poll { source: PollError },
}

pub type DpollResult<T> = Result<T, DpollError>;

/// The message of an error followed by the messages of its causes.
pub fn describe(e: &DpollError) -> String {
    let mut msg = e.to_string();
    let mut cur: Option<&dyn std::error::Error> = std::error::Error::source(e);
    while let Some(src) = cur {
        let s = src.to_string();
        if !msg.ends_with(&s) {
            msg = format!("{}: {}", msg, s);
        }
        cur = src.source();
    }
    msg
}

// The current local time, as it is stored.
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn data_path(args: &Args, config: &PollConfig, root: &Path) -> PathBuf {
    match &args.data {
        Some(p) => PathBuf::from(p),
        None => root.join(config.data_file()),
    }
}

pub fn render_dates(calendar: &WorkdayCalendar) -> String {
    calendar
        .valid_dates()
        .iter()
        .map(|d| format!("{} {}\n", format_date(d), weekday_name(d)))
        .collect()
}

pub fn render_submission(s: &Submission) -> String {
    let mut dates: Vec<NaiveDate> = s.dates.clone();
    dates.sort();
    let dates_s: Vec<String> = dates
        .iter()
        .map(|d| format!("{} ({})", format_date(d), weekday_name(d)))
        .collect();
    let chosen = if dates_s.is_empty() {
        "no date".to_string()
    } else {
        dates_s.join(", ")
    };
    format!(
        "{}: {} [{}]\n",
        s.name,
        chosen,
        format_timestamp(&s.submitted_at)
    )
}

fn tally_to_json(tally: &[TallyRecord]) -> Vec<JSValue> {
    tally
        .iter()
        .map(|r| {
            json!({
                "date": format_date(&r.date),
                "weekday": weekday_name(&r.date),
                "votes": r.vote_count,
                "voters": r.voters,
            })
        })
        .collect()
}

fn top_to_json(top: &[TallyRecord]) -> Vec<JSValue> {
    top.iter()
        .enumerate()
        .map(|(idx, r)| {
            json!({
                "rank": idx + 1,
                "date": format_date(&r.date),
                "votes": r.vote_count,
            })
        })
        .collect()
}

pub fn build_summary_js(
    config: &PollConfig,
    calendar: &WorkdayCalendar,
    participants: usize,
    tally: &[TallyRecord],
    top: &[TallyRecord],
) -> JSValue {
    json!({
        "config": {
            "poll": config.poll_name(),
            "year": calendar.year(),
            "month": calendar.month(),
            "participants": participants,
        },
        "results": tally_to_json(tally),
        "top": top_to_json(top),
    })
}

pub fn render_report(
    config: &PollConfig,
    calendar: &WorkdayCalendar,
    participants: usize,
    tally: &[TallyRecord],
    top: &[TallyRecord],
) -> String {
    let mut out = format!(
        "{}: {} {} ({} participants)\n",
        config.poll_name(),
        calendar.month_name(),
        calendar.year(),
        participants
    );
    if top.is_empty() {
        out.push_str("No votes yet\n");
    }
    for (idx, r) in top.iter().enumerate() {
        out.push_str(&format!(
            "Rank #{}  {}  {} votes\n",
            idx + 1,
            format_date(&r.date),
            r.vote_count
        ));
    }
    out.push('\n');
    for r in tally.iter() {
        out.push_str(
            format!(
                "{} {:<9} {:>3}  {}",
                format_date(&r.date),
                weekday_name(&r.date),
                r.vote_count,
                r.voters.join(", ")
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn report<S: Storage>(
    config: &PollConfig,
    store: &SubmissionStore<S>,
    top_count: usize,
    out: Option<&str>,
    reference: Option<&str>,
) -> DpollResult<String> {
    let calendar = store.calendar();
    // One read for both the tally and the participant count.
    let rows = match store.list_all() {
        Ok(rows) => rows,
        Err(e) => {
            warn!("report: could not read the submissions, assuming none: {}", e);
            Vec::new()
        }
    };
    let participants = rows.len();
    let tally = compute_tally(&rows, &calendar.valid_dates());
    let top = top_n(&tally, top_count);
    for (idx, r) in top.iter().enumerate() {
        info!("Rank #{}: {} with {} votes", idx + 1, r.date, r.vote_count);
    }

    let summary_js = build_summary_js(config, calendar, participants, &tally, &top);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {
        path: out.unwrap_or("stdout"),
    })?;

    // The JSON summary alone goes to stdout when it is requested there.
    let mut to_stdout = false;
    match out {
        None => {}
        Some("stdout") => {
            println!("{}", pretty_js_stats);
            to_stdout = true;
        }
        Some(out_path) => {
            info!("Writing the report to {}", out_path);
            fs::write(out_path, &pretty_js_stats).context(WritingFileSnafu { path: out_path })?;
        }
    }

    // The reference report, if provided for comparison
    if let Some(summary_p) = reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu { path: summary_p })?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference report");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    let text = render_report(config, calendar, participants, &tally, &top);
    if to_stdout {
        debug!("report:\n{}", text);
        return Ok(String::new());
    }
    Ok(text)
}

fn submit<S: Storage>(
    store: &SubmissionStore<S>,
    name: &str,
    dates: &[String],
    now: NaiveDateTime,
) -> DpollResult<String> {
    let dates = parse_dates(dates)?;
    let session = Session::new()
        .login(name, store)
        .context(PollSnafu {})?
        .select(&dates)
        .submit(store, now)
        .context(PollSnafu {})?;
    let saved = store
        .get(name)
        .context(PollSnafu {})?
        .map(|s| render_submission(&s))
        .unwrap_or_default();
    debug!("submit: {:?}", session);
    Ok(format!("Saved. {}", saved))
}

fn toggle<S: Storage>(
    store: &SubmissionStore<S>,
    name: &str,
    date: &str,
    now: NaiveDateTime,
) -> DpollResult<String> {
    let date = parse_date(date)?;
    let session = Session::new().login(name, store).context(PollSnafu {})?;
    let (session, outcome) = session.toggle(date, store.calendar());
    let msg = match outcome {
        ToggleOutcome::SelectionFull => {
            return Ok(format!(
                "You can only select up to {} dates: remove one before adding {}\n",
                MAX_DATES,
                format_date(&date)
            ));
        }
        ToggleOutcome::NotSelectable => {
            return Ok(format!(
                "{} ({}) cannot be selected\n",
                format_date(&date),
                weekday_name(&date)
            ));
        }
        ToggleOutcome::Added => "Added",
        ToggleOutcome::Removed => "Removed",
    };
    let session = session.submit(store, now).context(PollSnafu {})?;
    let selection: Vec<String> = session.sorted_selection().iter().map(format_date).collect();
    Ok(format!(
        "{} {}. Current selection: {}\n",
        msg,
        format_date(&date),
        selection.join(", ")
    ))
}

fn show<S: Storage>(store: &SubmissionStore<S>, name: &str) -> DpollResult<String> {
    match store.get(name).context(PollSnafu {})? {
        Some(s) => Ok(render_submission(&s)),
        None => Ok(format!("No submission for {:?}\n", name)),
    }
}

fn admin<S: Storage>(store: &SubmissionStore<S>, action: &AdminAction) -> DpollResult<String> {
    match action {
        AdminAction::List => {
            let rows = store.list_all().context(PollSnafu {})?;
            if rows.is_empty() {
                return Ok("No submissions yet\n".to_string());
            }
            Ok(rows.iter().map(render_submission).collect())
        }
        AdminAction::Delete { names } => {
            let removed = store.delete(names).context(PollSnafu {})?;
            Ok(format!("Deleted {} record(s)\n", removed))
        }
        AdminAction::Clear => {
            store.clear_all().context(PollSnafu {})?;
            Ok("All data has been wiped\n".to_string())
        }
        AdminAction::Export { out } => {
            let rows = store.list_all().context(PollSnafu {})?;
            if out == "stdout" {
                // Nothing but the table on stdout.
                let mut wtr = csv::Writer::from_writer(std::io::stdout());
                io_csv::write_table(&mut wtr, &rows, out)?;
                info!("Exported {} record(s) to stdout", rows.len());
                return Ok(String::new());
            }
            io_csv::write_submissions(Path::new(out), &rows)?;
            Ok(format!("Exported {} record(s)\n", rows.len()))
        }
    }
}

/// Runs one command against the poll described by the arguments and returns
/// the text to show to the user.
pub fn run(args: &Args) -> DpollResult<String> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (PollConfig::default_poll(), PathBuf::new()),
    };
    let calendar = config.calendar()?;
    let path = data_path(args, &config, &root);
    info!(
        "Poll {:?}: {} {}, data file {}",
        config.poll_name(),
        calendar.month_name(),
        calendar.year(),
        path.display()
    );
    let store = SubmissionStore::new(CsvStorage::new(path), calendar);

    match &args.command {
        Command::Dates => Ok(render_dates(store.calendar())),
        Command::Submit { name, dates } => submit(&store, name, dates, now()),
        Command::Toggle { name, date } => toggle(&store, name, date, now()),
        Command::Show { name } => show(&store, name),
        Command::Report {
            top,
            out,
            reference,
        } => report(
            &config,
            &store,
            top.unwrap_or(DEFAULT_TOP_N),
            out.as_deref(),
            reference.as_deref(),
        ),
        Command::Admin { password, action } => {
            ensure!(password == config.admin_password(), WrongPasswordSnafu {});
            admin(&store, action)
        }
    }
}
