//! Time instants: an integer count of seconds since the Unix epoch (UTC),
//! with ISO-8601 extended serialization (`YYYY-MM-DDThh:mm:ssZ`).

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};

/// Seconds since the Unix epoch, UTC. Zero is reserved to mean "no end"
/// (an open interval) in `Interval::end`, never a real instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(pub i64);

impl Instant {
    pub const ZERO: Instant = Instant(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn now() -> Instant {
        Instant(Utc::now().timestamp())
    }

    /// Parse `YYYY-MM-DDThh:mm:ssZ`, returning `Error::Parse` naming `field`
    /// on any malformed input.
    pub fn parse_iso(s: &str, field: &'static str) -> Result<Instant> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ")
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
            .map_err(|e| parse_err(field, format!("invalid ISO-8601 timestamp {s:?}: {e}")))?;
        Ok(Instant(dt.timestamp()))
    }

    pub fn to_iso_extended(self) -> String {
        Utc.timestamp_opt(self.0, 0)
            .single()
            .expect("seconds count is always representable")
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }

    /// The first second of the UTC month containing `self`.
    pub fn month_start(self) -> Instant {
        let dt = Utc.timestamp_opt(self.0, 0).single().unwrap();
        let first = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1).unwrap();
        Instant(first.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp())
    }

    /// The first second of the UTC month following `self`'s month.
    pub fn month_end(self) -> Instant {
        let dt = Utc.timestamp_opt(self.0, 0).single().unwrap();
        let (year, month) = if dt.month() == 12 {
            (dt.year() + 1, 1)
        } else {
            (dt.year(), dt.month() + 1)
        };
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        Instant(first.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp())
    }

    /// `YYYY-MM` key for the datafile owning this instant.
    pub fn month_key(self) -> String {
        let dt = Utc.timestamp_opt(self.0, 0).single().unwrap();
        format!("{:04}-{:02}", dt.year(), dt.month())
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "-")
        } else {
            write!(f, "{}", self.to_iso_extended())
        }
    }
}

fn parse_err(field: &'static str, detail: String) -> Error {
    Error::Parse {
        path: std::path::PathBuf::new(),
        line: 0,
        field,
        detail,
    }
}
