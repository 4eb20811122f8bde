//! Core units, constants, and shared primitives for the orbit_hop workspace.

/// Physical constants. Lengths in kilometres, times in seconds.
pub mod constants {
    /// Earth gravitational parameter (km³/s²), WGS-84.
    pub const MU_EARTH_KM3_S2: f64 = 398_600.4418;
    /// Earth equatorial radius (km), WGS-84.
    pub const EARTH_RADIUS_KM: f64 = 6_378.137;
    /// Full turn in radians.
    pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
}

/// Angle helpers.
pub mod units {
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v.to_radians()
    }

    #[inline]
    pub fn rad_to_deg(v: f64) -> f64 {
        v.to_degrees()
    }

    /// Wrap an angle into `[0, 2π)`.
    #[inline]
    pub fn wrap_two_pi(angle: f64) -> f64 {
        let wrapped = angle.rem_euclid(super::constants::TWO_PI);
        // rem_euclid can round up to exactly 2π for tiny negative inputs
        if wrapped >= super::constants::TWO_PI {
            0.0
        } else {
            wrapped
        }
    }
}

/// Epoch handling on top of `chrono`, all in UTC.
pub mod time {
    pub use chrono::{DateTime, TimeDelta, Utc};
    use chrono::NaiveDateTime;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TimeError {
        #[error("invalid epoch string `{epoch}`")]
        InvalidEpoch { epoch: String },
        #[error("offset of {seconds} s is not representable")]
        OutOfRange { seconds: f64 },
    }

    /// Parse an RFC 3339 epoch. Strings without an offset are taken as UTC.
    pub fn parse_epoch(epoch: &str) -> Result<DateTime<Utc>, TimeError> {
        let trimmed = epoch.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| TimeError::InvalidEpoch {
                epoch: epoch.to_string(),
            })
    }

    /// Signed seconds elapsed from `from` to `to`, with microsecond resolution.
    pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        let delta = to - from;
        match delta.num_microseconds() {
            Some(us) => us as f64 * 1.0e-6,
            None => delta.num_milliseconds() as f64 * 1.0e-3,
        }
    }

    /// Shift an epoch by a (possibly fractional, possibly negative) number of seconds.
    pub fn offset_by_seconds(epoch: DateTime<Utc>, seconds: f64) -> Result<DateTime<Utc>, TimeError> {
        let micros = (seconds * 1.0e6).round();
        if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
            return Err(TimeError::OutOfRange { seconds });
        }
        epoch
            .checked_add_signed(TimeDelta::microseconds(micros as i64))
            .ok_or(TimeError::OutOfRange { seconds })
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in kilometres or km/s depending on context.
    pub type Vector3 = [f64; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Distance between two points.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        norm(&sub(a, b))
    }

    /// Unit vector, or `None` when the input has (near) zero length.
    pub fn unit(v: &Vector3) -> Option<Vector3> {
        let n = norm(v);
        if n > f64::EPSILON && n.is_finite() {
            Some(scale(v, 1.0 / n))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_finite(v: &Vector3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::time::{offset_by_seconds, parse_epoch, seconds_between};
    use super::units::wrap_two_pi;
    use super::vector::{cross, unit};

    #[test]
    fn cross_follows_right_hand_rule() {
        assert_eq!(cross(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert!(unit(&[0.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn wrap_keeps_angles_in_range() {
        assert!((wrap_two_pi(-0.5) - (std::f64::consts::TAU - 0.5)).abs() < 1e-12);
        assert_eq!(wrap_two_pi(0.0), 0.0);
    }

    #[test]
    fn epoch_offsets_round_trip() {
        let start = parse_epoch("2024-03-01T12:00:00Z").expect("rfc3339");
        let naive = parse_epoch("2024-03-01T12:00:00").expect("naive utc");
        assert_eq!(start, naive);
        let later = offset_by_seconds(start, 1_000.25).expect("offset");
        assert!((seconds_between(start, later) - 1_000.25).abs() < 1e-6);
        assert!(parse_epoch("yesterday").is_err());
    }
}
