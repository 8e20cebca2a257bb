use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire format for offset-qualified timestamps: seconds precision, `+HHMM` offset without a colon
const ZONED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// `%#z` also takes hour-only offsets such as `+11`
const ZONED_INPUTS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];
const NAIVE_INPUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, thiserror::Error)]
#[error("unparseable timestamp {0:?}")]
pub struct TimestampError(pub String);

/// A point in time as supplied by the workflow, keeping whatever offset it came with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    pub fn in_timezone(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        let offset = local.offset().fix();
        Timestamp::Zoned(local.with_timezone(&offset))
    }

    /// Re-express the same instant in `tz`. Naive timestamps are read as UTC
    pub fn to_timezone(&self, tz: &Tz) -> Self {
        Timestamp::in_timezone(self.to_utc(), tz)
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Zoned(dt) => dt.with_timezone(&Utc),
            Timestamp::Naive(naive) => Utc.from_utc_datetime(naive),
        }
    }

    /// Calendar date only, used for dates of birth
    pub fn date_label(&self) -> String {
        let date = match self {
            Timestamp::Zoned(dt) => dt.date_naive(),
            Timestamp::Naive(naive) => naive.date(),
        };
        date.format("%Y-%m-%d").to_string()
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Timestamp::Zoned(dt));
        }
        let zoned = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            Some(utc) => format!("{utc}+0000"),
            None => s.to_string(),
        };
        for format in ZONED_INPUTS {
            if let Ok(dt) = DateTime::parse_from_str(&zoned, format) {
                return Ok(Timestamp::Zoned(dt));
            }
        }
        for format in NAIVE_INPUTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Timestamp::Naive(naive));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Timestamp::Naive)
            .ok_or_else(|| TimestampError(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Timestamp::Zoned(dt) => write!(f, "{}", dt.format(ZONED_FORMAT)),
            Timestamp::Naive(naive) => write!(f, "{}", naive.format(NAIVE_FORMAT)),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
