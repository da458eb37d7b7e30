//! Time conversion
//!
//! Julian Day, Julian centuries since J2000.0, mean obliquity of the ecliptic,
//! and Greenwich/Local Mean Sidereal Time.
//!
//! Every formula here takes a UTC instant. Civil (wall-clock) times are
//! converted through a [`CivilInstantResolver`] first; feeding local time
//! straight into GMST shifts every angle by the zone offset × 15°/h.

use crate::angles::normalize_deg;
use crate::error::EngineError;
use crate::types::CivilDateTime;
use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const MS_PER_DAY: f64 = 86_400_000.0;
/// Julian Day of the Unix epoch (1970-01-01T00:00:00Z).
pub const JULIAN_DAY_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian Day of J2000.0 (2000-01-01T12:00:00 TT, treated as UT here).
pub const JULIAN_DAY_J2000: f64 = 2_451_545.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
pub const DEGREES_PER_HOUR: f64 = 15.0;

/// Mean obliquity polynomial coefficients (degrees), highest order last.
const OBLIQUITY_COEFFICIENTS: [f64; 4] = [
    23.439_291_11,
    -0.013_004_166_666_7,
    -0.000_000_166_666_7,
    0.000_000_502_777_8,
];

/// A UTC instant as Unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtcInstant(pub i64);

impl UtcInstant {
    pub fn from_unix_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn unix_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for UtcInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

/// Julian Day for a UTC instant
pub fn julian_day(instant: UtcInstant) -> f64 {
    instant.0 as f64 / MS_PER_DAY + JULIAN_DAY_UNIX_EPOCH
}

/// Julian centuries elapsed since J2000.0
pub fn julian_centuries(jd: f64) -> f64 {
    (jd - JULIAN_DAY_J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Mean obliquity of the ecliptic in degrees for `t` Julian centuries
pub fn mean_obliquity_deg(t: f64) -> f64 {
    let [c0, c1, c2, c3] = OBLIQUITY_COEFFICIENTS;
    c0 + t * (c1 + t * (c2 + t * c3))
}

/// Greenwich Mean Sidereal Time in degrees, [0, 360)
pub fn gmst_deg(jd: f64) -> f64 {
    let t = julian_centuries(jd);
    let gmst = 280.460_618_37 + 360.985_647_366_29 * (jd - JULIAN_DAY_J2000)
        + 0.000_387_933 * t * t
        - (t * t * t) / 38_710_000.0;
    normalize_deg(gmst)
}

/// Local Sidereal Time in degrees, [0, 360). Longitude is east-positive.
pub fn lst_deg(jd: f64, longitude_deg: f64) -> f64 {
    normalize_deg(gmst_deg(jd) + longitude_deg)
}

pub fn degrees_to_hours(deg: f64) -> f64 {
    deg / DEGREES_PER_HOUR
}

/// All time-derived quantities the angle and house solvers need
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiderealFrame {
    pub julian_day: f64,
    pub centuries: f64,
    pub obliquity_deg: f64,
    pub gmst_deg: f64,
    pub lst_deg: f64,
}

impl SiderealFrame {
    /// Build the frame for a UTC instant and an east-positive longitude
    pub fn at(instant: UtcInstant, longitude_deg: f64) -> Self {
        let jd = julian_day(instant);
        let t = julian_centuries(jd);
        let frame = Self {
            julian_day: jd,
            centuries: t,
            obliquity_deg: mean_obliquity_deg(t),
            gmst_deg: gmst_deg(jd),
            lst_deg: lst_deg(jd, longitude_deg),
        };
        tracing::debug!(
            jd = frame.julian_day,
            gmst = frame.gmst_deg,
            lst = frame.lst_deg,
            obliquity = frame.obliquity_deg,
            "sidereal frame"
        );
        frame
    }

    pub fn lst_hours(&self) -> f64 {
        degrees_to_hours(self.lst_deg)
    }
}

/// Resolves a civil wall-clock time in a named zone to a UTC instant.
///
/// The geometry code depends only on this trait, never on a concrete
/// timezone database.
pub trait CivilInstantResolver {
    fn resolve_civil_instant(
        &self,
        civil: &CivilDateTime,
        timezone: &str,
    ) -> Result<UtcInstant, EngineError>;
}

/// IANA resolver backed by the bundled tz database
#[derive(Debug, Default, Clone, Copy)]
pub struct TzdbResolver;

impl CivilInstantResolver for TzdbResolver {
    fn resolve_civil_instant(
        &self,
        civil: &CivilDateTime,
        timezone: &str,
    ) -> Result<UtcInstant, EngineError> {
        let tz = parse_timezone(timezone)?;
        let naive = NaiveDate::from_ymd_opt(civil.year, civil.month, civil.day)
            .and_then(|d| d.and_hms_opt(civil.hour, civil.minute, civil.second))
            .ok_or_else(|| EngineError::DateParseError(civil.to_string()))?;

        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(UtcInstant::from(dt.with_timezone(&Utc))),
            // DST fall-back: the wall time occurs twice, take the first
            LocalResult::Ambiguous(earlier, _) => {
                Ok(UtcInstant::from(earlier.with_timezone(&Utc)))
            }
            LocalResult::None => Err(EngineError::DateParseError(format!(
                "{civil} does not exist in {timezone}"
            ))),
        }
    }
}

/// Parse an IANA zone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, EngineError> {
    timezone
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(timezone.to_string()))
}
