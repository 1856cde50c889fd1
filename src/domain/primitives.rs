//! Domain primitives: TimeMs, MemberId, Interval, and closed string enums.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MS_PER_HOUR: i64 = 3_600_000;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn now() -> Self {
        TimeMs(Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Instant of `time` on `date`, with the club calendar pinned to UTC.
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        TimeMs(date.and_time(time).and_utc().timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn plus_hours(&self, hours: i64) -> Self {
        TimeMs(self.0.saturating_add(hours.saturating_mul(MS_PER_HOUR)))
    }

    pub fn plus_secs(&self, secs: i64) -> Self {
        TimeMs(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// Signed fractional hours from `self` until `later`.
    ///
    /// The difference is taken in i128, so any pair of instants is defined.
    pub fn hours_until(&self, later: TimeMs) -> Decimal {
        let ms = i128::from(later.0) - i128::from(self.0);
        Decimal::from_i128_with_scale(ms, 0) / Decimal::from(MS_PER_HOUR)
    }
}

impl From<DateTime<Utc>> for TimeMs {
    fn from(value: DateTime<Utc>) -> Self {
        TimeMs(value.timestamp_millis())
    }
}

impl std::fmt::Display for TimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M"))
    }
}

/// Opaque member identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        MemberId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("interval end must be after start (start {start}, end {end})")]
pub struct InvalidInterval {
    pub start: i64,
    pub end: i64,
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: TimeMs,
    end: TimeMs,
}

impl Interval {
    pub fn new(start: TimeMs, end: TimeMs) -> Result<Self, InvalidInterval> {
        if end <= start {
            return Err(InvalidInterval {
                start: start.as_ms(),
                end: end.as_ms(),
            });
        }
        Ok(Interval { start, end })
    }

    pub fn start(&self) -> TimeMs {
        self.start
    }

    pub fn end(&self) -> TimeMs {
        self.end
    }

    /// `a.start < b.end && b.start < a.end`; touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_hours(&self) -> Decimal {
        self.start.hours_until(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {field}: '{value}'")]
pub struct UnrecognizedValue {
    pub field: &'static str,
    pub value: String,
}

/// Declares a closed enum stored as a lowercase token, with a total parser.
///
/// Parsing is case-insensitive and accepts the listed aliases; anything else is
/// an explicit `UnrecognizedValue`.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $token:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::UnrecognizedValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($token $(| $alias)* => Ok($name::$variant),)+
                    _ => Err($crate::domain::UnrecognizedValue {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use closed_enum;
