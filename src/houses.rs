//! House systems and house lookup
//!
//! Two systems are supported:
//! - Whole Sign: each house is one zodiac sign, starting with the Ascendant's sign
//! - Placidus: time-based trisection of each quadrant's diurnal/nocturnal semi-arc
//!
//! Placidus has no solution where ecliptic degrees become circumpolar
//! (roughly beyond the polar circles). There the solver substitutes equal
//! 30° houses from the Ascendant and marks the result as degenerate; it never
//! returns a partially filled or non-finite array.

use std::f64::consts::PI;

use crate::angles::{normalize_deg, ChartAngles};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

const PLACIDUS_MAX_ITERATIONS: usize = 100;
const PLACIDUS_TOLERANCE_RAD: f64 = 1e-12;

/// House system selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    WholeSign,
    #[default]
    Placidus,
}

impl HouseSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            HouseSystem::WholeSign => "whole_sign",
            HouseSystem::Placidus => "placidus",
        }
    }
}

impl std::str::FromStr for HouseSystem {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "whole_sign" | "wholesign" => Ok(HouseSystem::WholeSign),
            "placidus" => Ok(HouseSystem::Placidus),
            other => Err(EngineError::InvalidInput(format!(
                "unknown house system: {other}"
            ))),
        }
    }
}

/// Twelve house cusps (ecliptic longitude, degrees in [0, 360))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseCusps {
    pub system: HouseSystem,
    pub cusps: [f64; 12],
    /// Set when Placidus could not be solved and equal houses were substituted
    pub degenerate: bool,
}

impl HouseCusps {
    /// 1-based house containing `longitude`
    pub fn house_of(&self, longitude: f64) -> Result<u8, EngineError> {
        house_for_longitude(longitude, &self.cusps)
    }
}

/// Solve cusps for the requested system
pub fn solve_houses(
    system: HouseSystem,
    angles: &ChartAngles,
    lst_deg: f64,
    latitude_deg: f64,
    obliquity_deg: f64,
) -> HouseCusps {
    match system {
        HouseSystem::WholeSign => whole_sign(angles.ascendant),
        HouseSystem::Placidus => placidus(angles, lst_deg, latitude_deg, obliquity_deg),
    }
}

/// Whole Sign cusps: 0° of the Ascendant's sign, then every 30°
pub fn whole_sign(ascendant: f64) -> HouseCusps {
    let base = (normalize_deg(ascendant) / 30.0).floor() * 30.0;
    HouseCusps {
        system: HouseSystem::WholeSign,
        cusps: std::array::from_fn(|i| normalize_deg(base + 30.0 * i as f64)),
        degenerate: false,
    }
}

/// Equal 30° cusps starting at the Ascendant, used as the Placidus fallback
fn equal_from_ascendant(ascendant: f64) -> [f64; 12] {
    std::array::from_fn(|i| normalize_deg(ascendant + 30.0 * i as f64))
}

/// Placidus cusps
pub fn placidus(
    angles: &ChartAngles,
    lst_deg: f64,
    latitude_deg: f64,
    obliquity_deg: f64,
) -> HouseCusps {
    match solve_placidus(angles, lst_deg, latitude_deg, obliquity_deg) {
        Some(cusps) => HouseCusps {
            system: HouseSystem::Placidus,
            cusps,
            degenerate: false,
        },
        None => {
            tracing::warn!(
                latitude = latitude_deg,
                "placidus semi-arcs undefined; substituting equal houses from the ascendant"
            );
            HouseCusps {
                system: HouseSystem::Placidus,
                cusps: equal_from_ascendant(angles.ascendant),
                degenerate: true,
            }
        }
    }
}

fn solve_placidus(
    angles: &ChartAngles,
    lst_deg: f64,
    latitude_deg: f64,
    obliquity_deg: f64,
) -> Option<[f64; 12]> {
    if !(angles.ascendant.is_finite() && angles.midheaven.is_finite()) {
        return None;
    }

    let ramc = lst_deg.to_radians();
    let lat = latitude_deg.to_radians();
    let eps = obliquity_deg.to_radians();

    let mut cusps = [0.0; 12];
    cusps[0] = angles.ascendant;
    cusps[3] = angles.imum_coeli;
    cusps[6] = angles.descendant;
    cusps[9] = angles.midheaven;

    // 11, 12: MC → Asc, thirds of the diurnal semi-arc
    cusps[10] = placidus_cusp(ramc, lat, eps, 1.0 / 3.0, true)?;
    cusps[11] = placidus_cusp(ramc, lat, eps, 2.0 / 3.0, true)?;

    // 2, 3: Asc → IC, thirds of the nocturnal semi-arc back from the IC
    cusps[1] = placidus_cusp(ramc, lat, eps, 2.0 / 3.0, false)?;
    cusps[2] = placidus_cusp(ramc, lat, eps, 1.0 / 3.0, false)?;

    cusps[4] = normalize_deg(cusps[10] + 180.0);
    cusps[5] = normalize_deg(cusps[11] + 180.0);
    cusps[7] = normalize_deg(cusps[1] + 180.0);
    cusps[8] = normalize_deg(cusps[2] + 180.0);

    cusps.iter().all(|c| c.is_finite()).then_some(cusps)
}

/// One intermediate Placidus cusp: the right ascension satisfying
/// RA = RAMC + f·DSA(δ) (diurnal) or RA = RAIC − f·NSA(δ) (nocturnal), where
/// δ is the declination of the ecliptic point at that RA.
///
/// Semi-arcs lie in [0, π], so the root is bracketed by the values the right
/// side takes at semi-arcs of 0 and π, and bisection closes on it at any
/// latitude inside the polar circles. `None` only when a semi-arc is
/// undefined (circumpolar point).
fn placidus_cusp(ramc: f64, lat: f64, eps: f64, fraction: f64, diurnal: bool) -> Option<f64> {
    let residual = |ra: f64| -> Option<f64> {
        let dec = (eps.tan() * ra.sin()).atan();
        let sa = semi_arc(dec, lat, diurnal)?;
        let target = if diurnal {
            ramc + fraction * sa
        } else {
            ramc + PI - fraction * sa
        };
        Some(ra - target)
    };

    // residual(lo) ≤ 0 ≤ residual(hi)
    let (mut lo, mut hi) = if diurnal {
        (ramc, ramc + fraction * PI)
    } else {
        (ramc + PI - fraction * PI, ramc + PI)
    };
    residual(lo)?;
    residual(hi)?;

    for _ in 0..PLACIDUS_MAX_ITERATIONS {
        if hi - lo < PLACIDUS_TOLERANCE_RAD {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if residual(mid)? <= 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let ra = 0.5 * (lo + hi);

    let lon = f64::atan2(ra.sin(), ra.cos() * eps.cos()).to_degrees();
    lon.is_finite().then(|| normalize_deg(lon))
}

/// Diurnal or nocturnal semi-arc (radians); `None` for circumpolar points
fn semi_arc(dec: f64, lat: f64, diurnal: bool) -> Option<f64> {
    let cos_ha = -(dec.tan() * lat.tan());
    if !cos_ha.is_finite() || cos_ha.abs() > 1.0 {
        return None;
    }
    let ha = cos_ha.acos();
    Some(if diurnal { ha } else { PI - ha })
}

/// 1-based house index for `longitude` given any 12-cusp array.
///
/// House `i` spans `[cusps[i], cusps[i+1])` going forward. When a pair wraps
/// through 0° (`cusps[i] > cusps[i+1]`) membership is
/// `λ ≥ cusps[i] || λ < cusps[i+1]`. A point exactly on a cusp belongs to the
/// house that starts there.
pub fn house_for_longitude(longitude: f64, cusps: &[f64; 12]) -> Result<u8, EngineError> {
    if !longitude.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "longitude must be finite, got {longitude}"
        )));
    }
    let lon = normalize_deg(longitude);

    for i in 0..12 {
        let start = cusps[i];
        let end = cusps[(i + 1) % 12];
        let inside = if start <= end {
            lon >= start && lon < end
        } else {
            lon >= start || lon < end
        };
        if inside {
            return Ok(i as u8 + 1);
        }
    }

    Err(EngineError::InvalidInput(
        "house cusps do not partition the ecliptic".to_string(),
    ))
}
