use crate::poll::io_common::parse_date;
use crate::poll::*;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_NAME: &str = "Dinner Survey";
pub const DEFAULT_DATA_FILE: &str = "data/submissions.csv";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(rename = "pollName")]
    pub poll_name: Option<String>,
    #[serde(rename = "targetYear")]
    pub target_year: i32,
    #[serde(rename = "targetMonth")]
    pub target_month: u32,
    #[serde(rename = "dataFile")]
    pub data_file: Option<String>,
    #[serde(rename = "adminPassword")]
    pub admin_password: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "pollSettings")]
    pub poll_settings: PollSettings,
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl PollConfig {
    /// The dinner poll of January 2026, with New Year's Day and the following day off.
    pub fn default_poll() -> PollConfig {
        PollConfig {
            poll_settings: PollSettings {
                poll_name: None,
                target_year: 2026,
                target_month: 1,
                data_file: None,
                admin_password: None,
            },
            holidays: vec!["2026-01-01".to_string(), "2026-01-02".to_string()],
        }
    }

    pub fn poll_name(&self) -> &str {
        self.poll_settings
            .poll_name
            .as_deref()
            .unwrap_or(DEFAULT_POLL_NAME)
    }

    pub fn admin_password(&self) -> &str {
        self.poll_settings
            .admin_password
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_PASSWORD)
    }

    pub fn data_file(&self) -> &str {
        self.poll_settings
            .data_file
            .as_deref()
            .unwrap_or(DEFAULT_DATA_FILE)
    }

    pub fn calendar(&self) -> DpollResult<WorkdayCalendar> {
        let holidays: Vec<NaiveDate> = self
            .holidays
            .iter()
            .map(|s| parse_date(s))
            .collect::<DpollResult<Vec<NaiveDate>>>()?;
        WorkdayCalendar::new(
            self.poll_settings.target_year,
            self.poll_settings.target_month,
            &holidays,
        )
        .context(PollSnafu {})
    }
}

pub fn read_config(path: &str) -> DpollResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PollConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// A report previously written with `--out`.
pub fn read_summary(path: &str) -> DpollResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let js = r#"{"pollSettings": {"targetYear": 2025, "targetMonth": 12}}"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.poll_name(), DEFAULT_POLL_NAME);
        assert_eq!(config.admin_password(), "admin");
        assert_eq!(config.data_file(), "data/submissions.csv");
        assert!(config.holidays.is_empty());
        let cal = config.calendar().unwrap();
        assert_eq!(cal.valid_dates().len(), 23);
    }

    #[test]
    fn full_config() {
        let js = r#"{
            "pollSettings": {
                "pollName": "Team lunch",
                "targetYear": 2026,
                "targetMonth": 3,
                "dataFile": "lunch.csv",
                "adminPassword": "s3cret"
            },
            "holidays": ["2026-03-02"]
        }"#;
        let config: PollConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.poll_name(), "Team lunch");
        assert_eq!(config.admin_password(), "s3cret");
        assert_eq!(config.data_file(), "lunch.csv");
        let cal = config.calendar().unwrap();
        assert!(!cal.is_workday(&NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
        assert!(cal.is_workday(&NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()));
    }

    #[test]
    fn bad_month_and_bad_holiday() {
        let mut config = PollConfig::default_poll();
        config.poll_settings.target_month = 13;
        assert!(matches!(
            config.calendar(),
            Err(DpollError::Poll {
                source: PollError::InvalidMonth { .. }
            })
        ));

        let mut config = PollConfig::default_poll();
        config.holidays.push("2026-01-32".to_string());
        assert!(matches!(
            config.calendar(),
            Err(DpollError::InvalidDate { .. })
        ));
    }

    #[test]
    fn default_poll_is_january_2026() {
        let cal = PollConfig::default_poll().calendar().unwrap();
        assert_eq!((cal.year(), cal.month()), (2026, 1));
        assert_eq!(cal.valid_dates().len(), 20);
    }
}
