//! Reporting window: "start of today" to "now" in the configured time zone

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Time zone the day boundary is computed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTimezone {
    /// The host's local zone (DST-aware at the day boundary)
    Local,
    /// A fixed UTC offset such as `UTC` or `+08:00`
    Fixed(FixedOffset),
}

impl FromStr for ReportTimezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(ReportTimezone::Local),
            "utc" | "z" | "gmt" => {
                return Ok(ReportTimezone::Fixed(Utc.fix()));
            }
            _ => {}
        }

        let trimmed = trimmed
            .strip_prefix("UTC")
            .or_else(|| trimmed.strip_prefix("utc"))
            .unwrap_or(trimmed);
        parse_offset(trimmed)
            .map(ReportTimezone::Fixed)
            .ok_or_else(|| {
                format!(
                    "expected 'local', 'UTC' or an offset like '+08:00', got '{}'",
                    s
                )
            })
    }
}

impl fmt::Display for ReportTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportTimezone::Local => write!(f, "local"),
            ReportTimezone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Parse `+HH:MM`, `+HHMM` or `+HH` into a fixed offset
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// The `(since, until)` instant pair a run reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub since: DateTime<FixedOffset>,
    pub until: DateTime<FixedOffset>,
}

impl ReportWindow {
    /// Window from the start of today to now
    pub fn today(timezone: ReportTimezone) -> Self {
        Self::ending_at(timezone, Utc::now())
    }

    /// Window from the start of the day containing `now` up to `now`
    pub fn ending_at(timezone: ReportTimezone, now: DateTime<Utc>) -> Self {
        match timezone {
            ReportTimezone::Fixed(offset) => {
                let until = now.with_timezone(&offset);
                let since = until
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|midnight| offset.from_local_datetime(&midnight).single())
                    .unwrap_or(until);
                Self { since, until }
            }
            ReportTimezone::Local => {
                let local_now = now.with_timezone(&Local);
                // Midnight can be skipped by a DST jump; take the earliest valid instant.
                let since = local_now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
                    .map(|dt| dt.fixed_offset())
                    .unwrap_or_else(|| local_now.fixed_offset());
                Self {
                    since,
                    until: local_now.fixed_offset(),
                }
            }
        }
    }

    /// Start of the window as Unix epoch seconds
    pub fn since_epoch(&self) -> i64 {
        self.since.timestamp()
    }

    /// End of the window as Unix epoch seconds
    pub fn until_epoch(&self) -> i64 {
        self.until.timestamp()
    }

    /// Inclusive check for a Unix epoch timestamp
    pub fn contains_epoch(&self, seconds: i64) -> bool {
        (self.since_epoch()..=self.until_epoch()).contains(&seconds)
    }

    /// Calendar date of the report, e.g. `2024-05-01`
    pub fn date_label(&self) -> String {
        self.since.format("%Y-%m-%d").to_string()
    }
}
