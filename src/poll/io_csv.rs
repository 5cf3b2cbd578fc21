// Primitives for reading and writing the submissions table.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::poll::io_common::{format_date, format_timestamp, parse_date};
use crate::poll::*;

pub const NAME_COLUMN: &str = "Name";
pub const DATE_COLUMNS: [&str; MAX_DATES] = ["Date 1", "Date 2", "Date 3"];
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// The submissions, stored in a CSV file.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    pub fn new(path: PathBuf) -> CsvStorage {
        CsvStorage { path }
    }
}

impl Storage for CsvStorage {
    fn load(&self) -> Result<Vec<Submission>, PollError> {
        read_submissions(&self.path).map_err(PollError::persistence)
    }

    fn save(&self, submissions: &[Submission]) -> Result<(), PollError> {
        write_submissions(&self.path, submissions).map_err(PollError::persistence)
    }

    fn clear(&self) -> Result<(), PollError> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .context(WritingFileSnafu {
                    path: self.path.display().to_string(),
                })
                .map_err(PollError::persistence)?;
        }
        Ok(())
    }
}

struct Columns {
    name: usize,
    dates: Vec<usize>,
    timestamp: usize,
}

fn locate_columns(headers: &csv::StringRecord, path: &str) -> DpollResult<Columns> {
    let find = |column: &str| -> DpollResult<usize> {
        headers
            .iter()
            .position(|h| h == column)
            .context(CsvMissingColumnSnafu { path, column })
    };
    Ok(Columns {
        name: find(NAME_COLUMN)?,
        dates: DATE_COLUMNS
            .iter()
            .map(|c| find(c))
            .collect::<DpollResult<Vec<usize>>>()?,
        timestamp: find(TIMESTAMP_COLUMN)?,
    })
}

/// Reads all the submissions of the table, in file order.
///
/// A missing file is an empty table. Dates that cannot be read are skipped.
/// Rows without a name are kept as they are, so that rewriting the table
/// does not lose them.
pub fn read_submissions(path: &Path) -> DpollResult<Vec<Submission>> {
    let p = path.display().to_string();
    if !path.exists() {
        debug!("read_submissions: {} does not exist yet", p);
        return Ok(Vec::new());
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path: p.clone() })?;
    let headers = rdr.headers().context(CsvOpenSnafu { path: p.clone() })?.clone();
    if headers.is_empty() {
        // An empty file.
        return Ok(Vec::new());
    }
    let columns = locate_columns(&headers, &p)?;

    let mut res: Vec<Submission> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: p.clone(),
            lineno,
        })?;
        debug!("read_submissions: lineno: {:?} row: {:?}", lineno, line);
        let name = line
            .get(columns.name)
            .context(CsvLineTooShortSnafu {
                path: p.clone(),
                lineno,
            })?
            .to_string();
        if name.is_empty() {
            warn!("read_submissions: line {} of {}: row without name", lineno, p);
        }

        let mut dates: Vec<NaiveDate> = Vec::new();
        for col in columns.dates.iter() {
            match line.get(*col) {
                None | Some("") => {}
                Some(cell) => match parse_date(cell) {
                    Ok(d) => dates.push(d),
                    Err(e) => {
                        warn!(
                            "read_submissions: line {} of {}: skipping date: {}",
                            lineno, p, e
                        );
                    }
                },
            }
        }

        let ts_cell = line.get(columns.timestamp).context(CsvLineTooShortSnafu {
            path: p.clone(),
            lineno,
        })?;
        let submitted_at = NaiveDateTime::parse_from_str(ts_cell.trim(), TIMESTAMP_FORMAT)
            .context(InvalidTimestampSnafu {
                value: ts_cell,
                lineno,
            })?;

        res.push(Submission {
            name,
            dates,
            submitted_at,
        });
    }
    debug!("read_submissions: {} rows in {}", res.len(), p);
    Ok(res)
}

/// Writes the table to any destination.
pub fn write_table<W: Write>(
    wtr: &mut csv::Writer<W>,
    submissions: &[Submission],
    path: &str,
) -> DpollResult<()> {
    let mut header: Vec<&str> = vec![NAME_COLUMN];
    header.extend(DATE_COLUMNS.iter());
    header.push(TIMESTAMP_COLUMN);
    wtr.write_record(&header).context(CsvWriteSnafu { path })?;

    for s in submissions.iter() {
        let mut row: Vec<String> = vec![s.name.clone()];
        for slot in s.date_slots().iter() {
            row.push(slot.as_ref().map(format_date).unwrap_or_default());
        }
        row.push(format_timestamp(&s.submitted_at));
        wtr.write_record(&row).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    Ok(())
}

/// Replaces the content of the table.
///
/// The new table is fully written and synced to a fresh temporary file next
/// to the target before it is renamed over it: on failure, the previous table
/// is left as it was. Concurrent writers each use their own temporary file,
/// the last rename wins.
pub fn write_submissions(path: &Path, submissions: &[Submission]) -> DpollResult<()> {
    let p = path.display().to_string();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).context(WritingFileSnafu { path: p.clone() })?;

    // Removed on drop if anything fails before the rename.
    let tmp = tempfile::Builder::new()
        .prefix(".submissions")
        .suffix(".tmp")
        .tempfile_in(parent)
        .context(WritingFileSnafu { path: p.clone() })?;
    let tp = tmp.path().display().to_string();
    let mut wtr = csv::Writer::from_writer(tmp);
    write_table(&mut wtr, submissions, &tp)?;
    let tmp = wtr
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        .context(WritingFileSnafu { path: tp.clone() })?;
    tmp.as_file()
        .sync_all()
        .context(WritingFileSnafu { path: tp })?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .context(WritingFileSnafu { path: p.clone() })?;
    info!("write_submissions: wrote {} rows to {}", submissions.len(), p);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn sample() -> Vec<Submission> {
        vec![
            Submission {
                name: "Alice".to_string(),
                dates: vec![day(5), day(6)],
                submitted_at: ts("2026-01-03 18:42:10"),
            },
            Submission {
                name: "Bob, Jr.".to_string(),
                dates: vec![],
                submitted_at: ts("2026-01-04 09:01:55"),
            },
        ]
    }

    #[test]
    fn table_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("submissions.csv");
        write_submissions(&path, &sample()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Name,Date 1,Date 2,Date 3,Timestamp\n\
             Alice,2026-01-05,2026-01-06,,2026-01-03 18:42:10\n\
             \"Bob, Jr.\",,,,2026-01-04 09:01:55\n"
        );
        assert_eq!(read_submissions(&path).unwrap(), sample());
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        assert!(read_submissions(&path).unwrap().is_empty());
        fs::write(&path, "").unwrap();
        assert!(read_submissions(&path).unwrap().is_empty());
    }

    #[test]
    fn unreadable_dates_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        fs::write(
            &path,
            "Timestamp,Name,Date 1,Date 2,Date 3\n\
             2026-01-03 18:42:10,Alice,2026-01-05,tomorrow,2026-01-07\n",
        )
        .unwrap();
        let rows = read_submissions(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dates, vec![day(5), day(7)]);
    }

    #[test]
    fn bad_timestamp_and_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        fs::write(&path, "Name,Date 1,Date 2,Date 3,Timestamp\nAlice,,,,yesterday\n").unwrap();
        assert!(matches!(
            read_submissions(&path),
            Err(DpollError::InvalidTimestamp { lineno: 2, .. })
        ));

        fs::write(&path, "Name,Date 1,Date 2,Timestamp\n").unwrap();
        assert!(matches!(
            read_submissions(&path),
            Err(DpollError::CsvMissingColumn { .. })
        ));

        let storage = CsvStorage::new(path);
        assert!(matches!(
            storage.load(),
            Err(PollError::Persistence { .. })
        ));
    }

    #[test]
    fn failed_write_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        // A directory stands where the table should be: the rename fails.
        let path = dir.path().join("submissions.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "keep").unwrap();
        let storage = CsvStorage::new(path.clone());
        let err = storage.save(&sample()).unwrap_err();
        assert!(matches!(err, PollError::Persistence { .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "keep");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn rewrites_replace_the_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        write_submissions(&path, &sample()).unwrap();
        write_submissions(&path, &sample()[..1]).unwrap();
        assert_eq!(read_submissions(&path).unwrap(), sample()[..1].to_vec());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn concurrent_writers_do_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let path = path.clone();
                std::thread::spawn(move || {
                    // One store per thread, like one process per command.
                    let cal = WorkdayCalendar::new(2026, 1, &[]).unwrap();
                    let store = SubmissionStore::new(CsvStorage::new(path), cal);
                    let mut failures = 0;
                    for i in 0..50 {
                        let name = format!("writer {} #{}", t, i % 5);
                        if store.upsert(&name, &[day(5)], ts("2026-01-03 18:42:10")).is_err() {
                            failures += 1;
                        }
                    }
                    failures
                })
            })
            .collect();
        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);
        assert!(!read_submissions(&path).unwrap().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn duplicate_names_the_last_row_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        fs::write(
            &path,
            "Name,Date 1,Date 2,Date 3,Timestamp\n\
             Alice,2026-01-05,,,2026-01-03 18:42:10\n\
             Bob,2026-01-06,,,2026-01-03 19:00:00\n\
             Alice,2026-01-07,2026-01-08,,2026-01-04 08:15:00\n",
        )
        .unwrap();
        let cal = WorkdayCalendar::new(2026, 1, &[]).unwrap();
        let store = SubmissionStore::new(CsvStorage::new(path), cal);
        let alice = store.get("Alice").unwrap().unwrap();
        assert_eq!(alice.dates, vec![day(7), day(8)]);
        assert_eq!(alice.submitted_at, ts("2026-01-04 08:15:00"));
    }

    #[test]
    fn rows_without_name_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        fs::write(
            &path,
            "Name,Date 1,Date 2,Date 3,Timestamp\n\
             Alice,2026-01-05,,,2026-01-03 18:42:10\n\
             ,2026-01-07,,,2026-01-03 19:00:00\n",
        )
        .unwrap();
        let cal = WorkdayCalendar::new(2026, 1, &[]).unwrap();
        let store = SubmissionStore::new(CsvStorage::new(path.clone()), cal);
        store
            .upsert("Bob", &[day(6)], ts("2026-01-04 08:15:00"))
            .unwrap();
        let names: Vec<String> = read_submissions(&path)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec!["Alice".to_string(), "".to_string(), "Bob".to_string()]
        );
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.csv");
        let storage = CsvStorage::new(path.clone());
        storage.clear().unwrap();
        storage.save(&sample()).unwrap();
        assert!(path.exists());
        storage.clear().unwrap();
        assert!(!path.exists());
        assert!(storage.load().unwrap().is_empty());
    }
}
