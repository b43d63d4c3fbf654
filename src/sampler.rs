//! Uniform range sampling for the scalar argument kinds.
//!
//! Each function takes a (min, max) pair and returns a value sampled from
//! the half-open interval `[min, max)`, except when `min == max`, in which
//! case that value is returned deterministically. Bounds given in reverse
//! order are swapped transparently. None of these ever fail.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

pub fn int(min: i64, max: i64) -> i64 {
    if min == max {
        return min;
    }
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    rand::thread_rng().gen_range(min..max)
}

pub fn float(min: f64, max: f64) -> f64 {
    if min == max {
        return min;
    }
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    rand::thread_rng().gen_range(min..max)
}

/// Samples at one-second resolution: both bounds are converted to
/// seconds-since-epoch, an integer is sampled in that range, and the
/// result is materialised back into a timestamp.
pub fn timestamp(min: DateTime<Utc>, max: DateTime<Utc>) -> DateTime<Utc> {
    if min == max {
        return min;
    }
    let (min, max) = if min > max { (max, min) } else { (min, max) };

    let min_secs = min.timestamp();
    let max_secs = max.timestamp();

    let sampled_secs = int(min_secs, max_secs);
    DateTime::<Utc>::from_timestamp(sampled_secs, 0).unwrap_or(min)
}

pub fn interval(min: Duration, max: Duration) -> Duration {
    if min == max {
        return min;
    }
    let (min, max) = if min > max { (max, min) } else { (min, max) };

    let min_nanos = min.as_nanos() as i64;
    let max_nanos = max.as_nanos() as i64;
    let sampled_nanos = int(min_nanos, max_nanos);
    Duration::from_nanos(sampled_nanos.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_min_equals_max_is_deterministic() {
        for _ in 0..100 {
            assert_eq!(int(5, 5), 5);
        }
    }

    #[test]
    fn int_in_range() {
        for _ in 0..10_000 {
            let v = int(1, 10);
            assert!((1..10).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn int_swaps_reversed_bounds() {
        for _ in 0..10_000 {
            let v = int(10, 1);
            assert!((1..10).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn float_in_range() {
        for _ in 0..10_000 {
            let v = float(1.0, 2.0);
            assert!((1.0..2.0).contains(&v));
        }
    }

    #[test]
    fn timestamp_min_equals_max_is_exact() {
        let t = Utc::now();
        assert_eq!(timestamp(t, t), t);
    }

    #[test]
    fn timestamp_in_range() {
        let min = DateTime::<Utc>::from_timestamp(1_000_000, 0).unwrap();
        let max = DateTime::<Utc>::from_timestamp(1_000_100, 0).unwrap();
        for _ in 0..1000 {
            let v = timestamp(min, max);
            assert!(v >= min && v < max);
        }
    }

    #[test]
    fn interval_in_range() {
        let min = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        for _ in 0..1000 {
            let v = interval(min, max);
            assert!(v >= min && v < max);
        }
    }

    #[test]
    fn interval_min_equals_max() {
        let d = Duration::from_secs(3);
        assert_eq!(interval(d, d), d);
    }
}
