/*!

This is the long-form manual for `date_poll` and `dpoll`.

## Data file

The submissions are kept in a single CSV file, one row per participant:

```text
Name,Date 1,Date 2,Date 3,Timestamp
Alice,2026-01-05,2026-01-06,,2026-01-03 18:42:10
Bob,2026-01-06,,,2026-01-04 09:01:55
```

- `Name` is the key of the row. It is compared exactly: `alice` and `Alice` are two participants.
- `Date 1` to `Date 3` hold the chosen dates (`YYYY-MM-DD`). Unused slots are left empty.
- `Timestamp` is the local time of the last submission (`YYYY-MM-DD HH:MM:SS`).

Every write replaces the whole file: the new content is written next to the file and then
moved over it, so an interrupted write never leaves a half-written table behind.

A date cell that cannot be read is skipped with a warning. A row without a readable
timestamp makes the whole file unreadable. When the file cannot be read, the report
shows the poll as if nobody had voted yet.

## Candidate dates

The candidate dates are all the days from Monday to Friday of the target month, except
the holidays. Each participant chooses up to 3 of them. Dates that stop being candidates
(for example after adding a holiday) are kept in the file but no longer counted.

## Configuration

`dpoll` comes with the settings of a January 2026 dinner poll. Other polls are described
by a JSON file passed with `--config`:

```json
{
  "pollSettings": {
    "pollName": "Dinner Survey",
    "targetYear": 2026,
    "targetMonth": 1,
    "dataFile": "data/submissions.csv",
    "adminPassword": "admin"
  },
  "holidays": ["2026-01-01", "2026-01-02"]
}
```

- `targetYear`, `targetMonth` (numbers, mandatory): the month of the poll.
- `pollName` (string, optional): the title of the reports.
- `dataFile` (string, optional): the location of the CSV file, relative to the configuration file.
  It can be overridden with `--data`.
- `adminPassword` (string, optional, default `admin`): the shared password of the `admin` commands.
  It is a simple guard against mistakes, not a security feature.
- `holidays` (array of dates, optional): the dates that cannot be chosen.

## Report

`dpoll report` prints the 3 most popular dates (ties are broken by calendar order) and
the votes for every candidate date. With `--out`, the same information is written in JSON:

```json
{
  "config": { "month": 1, "participants": 2, "poll": "Dinner Survey", "year": 2026 },
  "results": [
    { "date": "2026-01-05", "voters": ["Alice"], "votes": 1, "weekday": "Monday" }
  ],
  "top": [
    { "date": "2026-01-06", "rank": 1, "votes": 2 }
  ]
}
```

With `--reference`, the report is compared with a previously saved JSON report and the
differences are printed.

 */
