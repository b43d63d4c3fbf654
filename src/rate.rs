//! `N/DURATION` rate specifications, e.g. `"10/1s"`.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::error::DrkError;

/// A `times`-per-`interval` specification. Derives a strictly-positive
/// `ticker_interval = interval / times`.
///
/// Invariant: `times >= 1` and `interval > 0`, enforced at parse time —
/// a `times` of zero is a configuration error, not a runtime one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rate {
    pub times: u32,
    pub interval: Duration,
    ticker_interval: Duration,
}

impl Rate {
    pub fn parse(s: &str) -> Result<Self, DrkError> {
        let (times_str, interval_str) = s.split_once('/').ok_or_else(|| DrkError::FieldParse {
            field: "rate".to_string(),
            source: anyhow::anyhow!("expected the form \"N/DURATION\", got {s:?}"),
        })?;

        let times: u32 = times_str.parse().map_err(|e| DrkError::FieldParse {
            field: "times".to_string(),
            source: anyhow::anyhow!("{e}"),
        })?;

        let interval = humantime::parse_duration(interval_str).map_err(|e| DrkError::FieldParse {
            field: "interval".to_string(),
            source: anyhow::anyhow!("{e}"),
        })?;

        if times < 1 {
            return Err(DrkError::FieldParse {
                field: "times".to_string(),
                source: anyhow::anyhow!("times must be at least 1, got {times}"),
            });
        }
        if interval.is_zero() {
            return Err(DrkError::FieldParse {
                field: "interval".to_string(),
                source: anyhow::anyhow!("interval must not be zero"),
            });
        }

        Ok(Self {
            times,
            interval,
            ticker_interval: interval / times,
        })
    }

    pub fn ticker_interval(&self) -> Duration {
        self.ticker_interval
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.times, humantime::format_duration(self.interval))
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rate::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_times_and_interval() {
        let r = Rate::parse("10/1s").unwrap();
        assert_eq!(r.times, 10);
        assert_eq!(r.interval, Duration::from_secs(1));
        assert_eq!(r.ticker_interval(), Duration::from_millis(100));
    }

    #[test]
    fn rejects_zero_times() {
        assert!(Rate::parse("0/1s").is_err());
    }

    #[test]
    fn ticker_interval_times_times_approx_interval() {
        let r = Rate::parse("4/1s").unwrap();
        assert_eq!(r.ticker_interval() * r.times, r.interval);
    }

    #[test]
    fn round_trips_through_display() {
        let r = Rate::parse("10/1s").unwrap();
        assert_eq!(r.to_string(), "10/1s");
    }
}
