use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Level recorded when the caller does not provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// ISO-8601 calendar date, e.g. `2024-01-31`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO-8601 local time with as many fractional digits as needed.
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// One immutable log record stored under a tenant namespace.
///
/// `date` and `time` keep the textual form they were written with; date
/// filtering compares these strings, not parsed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(rename = "ClassName")]
    pub class_name: String,
    #[serde(rename = "logLevel")]
    pub log_level: String,
    pub date: String,
    pub time: String,
}

impl LogEntry {
    /// Builds an entry stamped with the given local date and time.
    pub fn stamped(
        message: impl Into<String>,
        class_name: impl Into<String>,
        log_level: impl Into<String>,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            message: message.into(),
            class_name: class_name.into(),
            log_level: log_level.into(),
            date: at.date().format(DATE_FORMAT).to_string(),
            time: at.time().format(TIME_FORMAT).to_string(),
        }
    }
}

/// Restricts a query to one calendar day, the half-open range
/// `[day, day + 1)` over the stored date strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    day: NaiveDate,
}

impl DateFilter {
    pub fn new(day: NaiveDate) -> Self {
        Self { day }
    }

    /// Parses a strict `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> Result<Self, DateFilterError> {
        let bytes = raw.as_bytes();
        let well_shaped = bytes.len() == 10
            && bytes.iter().enumerate().all(|(idx, byte)| match idx {
                4 | 7 => *byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !well_shaped {
            return Err(DateFilterError(raw.to_string()));
        }

        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Self::new)
            .map_err(|_| DateFilterError(raw.to_string()))
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Inclusive lower bound in stored form.
    pub fn lower_bound(&self) -> String {
        self.day.format(DATE_FORMAT).to_string()
    }

    /// Exclusive upper bound in stored form; `None` past the last representable day.
    pub fn upper_bound(&self) -> Option<String> {
        self.day
            .succ_opt()
            .map(|next| next.format(DATE_FORMAT).to_string())
    }

    pub fn matches(&self, stored_date: &str) -> bool {
        let lower = self.lower_bound();
        if stored_date < lower.as_str() {
            return false;
        }
        match self.upper_bound() {
            Some(upper) => stored_date < upper.as_str(),
            None => true,
        }
    }
}

/// Returned when a date filter is not a valid ISO calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilterError(pub String);

impl std::fmt::Display for DateFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` is not an ISO-8601 date (YYYY-MM-DD)", self.0)
    }
}

impl std::error::Error for DateFilterError {}
