//! Chart angles
//!
//! Ascendant and Midheaven from Local Sidereal Time, geographic latitude and
//! obliquity. Both are closed forms; there is no iteration here.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Wrap any finite angle into [0, 360)
pub fn normalize_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Shortest angular distance between two longitudes, [0, 180]
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let d = normalize_deg(a - b);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// The four chart angles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAngles {
    pub ascendant: f64,
    pub midheaven: f64,
    pub descendant: f64,
    pub imum_coeli: f64,
}

impl ChartAngles {
    fn from_asc_mc(ascendant: f64, midheaven: f64) -> Self {
        Self {
            ascendant,
            midheaven,
            descendant: normalize_deg(ascendant + 180.0),
            imum_coeli: normalize_deg(midheaven + 180.0),
        }
    }
}

/// Midheaven longitude (degrees) from LST and obliquity (degrees)
pub fn midheaven_deg(lst_deg: f64, obliquity_deg: f64) -> f64 {
    let lst = lst_deg.to_radians();
    let eps = obliquity_deg.to_radians();
    normalize_deg(f64::atan2(lst.sin(), lst.cos() * eps.cos()).to_degrees())
}

/// Ascendant longitude (degrees). Fails at the poles, where the horizon and
/// the ecliptic no longer intersect in a unique point.
pub fn ascendant_deg(
    lst_deg: f64,
    latitude_deg: f64,
    obliquity_deg: f64,
) -> Result<f64, EngineError> {
    check_latitude(latitude_deg)?;

    let lst = lst_deg.to_radians();
    let lat = latitude_deg.to_radians();
    let eps = obliquity_deg.to_radians();

    let y = lst.cos();
    let x = -lst.sin() * eps.cos() - lat.tan() * eps.sin();
    Ok(normalize_deg(f64::atan2(y, x).to_degrees()))
}

/// Solve all four angles
pub fn solve_angles(
    lst_deg: f64,
    latitude_deg: f64,
    obliquity_deg: f64,
) -> Result<ChartAngles, EngineError> {
    let asc = ascendant_deg(lst_deg, latitude_deg, obliquity_deg)?;
    let mc = midheaven_deg(lst_deg, obliquity_deg);
    tracing::debug!(ascendant = asc, midheaven = mc, "angles solved");
    Ok(ChartAngles::from_asc_mc(asc, mc))
}

fn check_latitude(latitude_deg: f64) -> Result<(), EngineError> {
    if !latitude_deg.is_finite() {
        return Err(EngineError::InvalidCoordinate {
            field: "latitude",
            value: latitude_deg,
        });
    }
    if latitude_deg.abs() >= 90.0 {
        return Err(EngineError::LatitudeDomain(latitude_deg));
    }
    Ok(())
}
