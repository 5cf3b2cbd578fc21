use crate::poll::*;

pub fn parse_date(s: &str) -> DpollResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).context(InvalidDateSnafu { value: s })
}

pub fn parse_dates(values: &[String]) -> DpollResult<Vec<NaiveDate>> {
    values.iter().map(|s| parse_date(s)).collect()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn weekday_name(date: &NaiveDate) -> String {
    date.format("%A").to_string()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
