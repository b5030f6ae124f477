//! Aggregation windows accepted by the index endpoints

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported interval '{0}'. Supported: 1d, 1w, 1m, 3m, 6m, 1y")]
pub struct IntervalError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub enum Interval {
    #[default]
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::OneDay,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
        Interval::SixMonths,
        Interval::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneDay => "1d",
            Interval::OneWeek => "1w",
            Interval::OneMonth => "1m",
            Interval::ThreeMonths => "3m",
            Interval::SixMonths => "6m",
            Interval::OneYear => "1y",
        }
    }

    /// Length of the window that ends at the newest record.
    pub fn to_duration(&self) -> Duration {
        match self {
            Interval::OneDay => Duration::days(1),
            Interval::OneWeek => Duration::days(7),
            Interval::OneMonth => Duration::days(30),
            Interval::ThreeMonths => Duration::days(90),
            Interval::SixMonths => Duration::days(180),
            Interval::OneYear => Duration::days(365),
        }
    }

    /// Width of one series bucket.
    pub fn step(&self) -> Duration {
        match self {
            Interval::OneDay => Duration::hours(1),
            Interval::OneWeek | Interval::OneMonth => Duration::days(1),
            Interval::ThreeMonths | Interval::SixMonths | Interval::OneYear => Duration::weeks(1),
        }
    }

    /// Resolves an optional query value; absent or blank means the shortest window.
    pub fn from_query(raw: Option<&str>) -> Result<Self, IntervalError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Interval::default()),
            Some(value) => value.parse(),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" => Ok(Interval::OneDay),
            "1w" | "7d" => Ok(Interval::OneWeek),
            "1m" | "30d" => Ok(Interval::OneMonth),
            "3m" => Ok(Interval::ThreeMonths),
            "6m" => Ok(Interval::SixMonths),
            "1y" => Ok(Interval::OneYear),
            _ => Err(IntervalError(s.to_string())),
        }
    }
}

impl Serialize for Interval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
