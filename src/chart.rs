//! Chart geometry
//!
//! BirthMoment → UTC instant → sidereal frame → angles → house cusps, plus
//! body placement and relocation. Relocation keeps every body's longitude and
//! recomputes only angles and houses for the new place at the birth instant.

use crate::angles::solve_angles;
use crate::aspects::{derive_aspects, Aspect, BodyLongitude};
use crate::error::EngineError;
use crate::houses::{house_for_longitude, solve_houses, HouseSystem};
use crate::orbs::{orb_profile, ProfileId};
use crate::time::{CivilInstantResolver, SiderealFrame, TzdbResolver, UtcInstant};
use crate::types::{BirthMoment, GeoCoordinate};
use serde::{Deserialize, Serialize};

/// Angles and cusps for one instant and place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub instant: UtcInstant,
    pub location: GeoCoordinate,
    pub lst_hours: f64,
    pub obliquity: f64,
    pub ascendant: f64,
    pub midheaven: f64,
    pub descendant: f64,
    pub imum_coeli: f64,
    pub house_system: HouseSystem,
    pub house_cusps: [f64; 12],
    /// Placidus could not be solved; cusps are equal houses from the Ascendant
    pub degenerate: bool,
}

impl GeometrySnapshot {
    pub fn house_of(&self, longitude: f64) -> Result<u8, EngineError> {
        house_for_longitude(longitude, &self.house_cusps)
    }

    /// Angles that take part in aspects; DSC and IC only mirror them
    pub fn aspect_angles(&self) -> [BodyLongitude; 2] {
        [
            BodyLongitude::new("Ascendant", self.ascendant),
            BodyLongitude::new("Medium_Coeli", self.midheaven),
        ]
    }
}

/// Geometry for a UTC instant and place
pub fn geometry_at(
    instant: UtcInstant,
    location: GeoCoordinate,
    system: HouseSystem,
) -> Result<GeometrySnapshot, EngineError> {
    location.validate()?;
    let frame = SiderealFrame::at(instant, location.longitude);
    let angles = solve_angles(frame.lst_deg, location.latitude, frame.obliquity_deg)?;
    let houses = solve_houses(
        system,
        &angles,
        frame.lst_deg,
        location.latitude,
        frame.obliquity_deg,
    );

    Ok(GeometrySnapshot {
        instant,
        location,
        lst_hours: frame.lst_hours(),
        obliquity: frame.obliquity_deg,
        ascendant: angles.ascendant,
        midheaven: angles.midheaven,
        descendant: angles.descendant,
        imum_coeli: angles.imum_coeli,
        house_system: houses.system,
        house_cusps: houses.cusps,
        degenerate: houses.degenerate,
    })
}

/// Geometry for a birth moment, resolving civil time through `resolver`
pub fn compute_geometry_with<R: CivilInstantResolver>(
    resolver: &R,
    birth: &BirthMoment,
    system: HouseSystem,
) -> Result<GeometrySnapshot, EngineError> {
    birth.location.validate()?;
    let instant = resolver.resolve_civil_instant(&birth.date, &birth.timezone)?;
    tracing::debug!(
        civil = %birth.date,
        timezone = %birth.timezone,
        unix_ms = instant.unix_millis(),
        "resolved birth instant"
    );
    geometry_at(instant, birth.location, system)
}

/// Geometry for a birth moment using the bundled tz database
pub fn compute_geometry(
    birth: &BirthMoment,
    system: HouseSystem,
) -> Result<GeometrySnapshot, EngineError> {
    compute_geometry_with(&TzdbResolver, birth, system)
}

/// A body and the house it falls in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPlacement {
    pub name: String,
    pub longitude: f64,
    pub house: u8,
}

pub fn place_bodies(
    snapshot: &GeometrySnapshot,
    bodies: &[BodyLongitude],
) -> Result<Vec<BodyPlacement>, EngineError> {
    bodies
        .iter()
        .map(|b| {
            Ok(BodyPlacement {
                name: b.name.clone(),
                longitude: b.longitude,
                house: snapshot.house_of(b.longitude)?,
            })
        })
        .collect()
}

/// Target place for a relocated chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relocation {
    pub location: GeoCoordinate,
    #[serde(default)]
    pub label: Option<String>,
}

/// Human-readable line describing which frame houses were computed in
pub fn relocation_disclosure(relocation: Option<&Relocation>, snapshot: &GeometrySnapshot) -> String {
    let mut line = match relocation {
        None => "Relocation: None (birthplace houses/angles).".to_string(),
        Some(r) => {
            let place = r
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or("Selected city");
            format!("Relocation on: {place}. Houses/angles move; planets stay fixed.")
        }
    };
    if snapshot.degenerate {
        line.push_str(" Placidus undefined at this latitude; equal houses from the Ascendant.");
    }
    line
}

/// A full chart request, as read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub birth: BirthMoment,
    #[serde(default)]
    pub relocation: Option<Relocation>,
    #[serde(default)]
    pub house_system: HouseSystem,
    /// Natal body longitudes from the ephemeris
    #[serde(default)]
    pub bodies: Vec<BodyLongitude>,
    #[serde(default)]
    pub orb_profile: Option<String>,
}

impl ChartRequest {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Natal (and optionally relocated) geometry with placements and aspects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartReport {
    pub natal: GeometrySnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relocated: Option<GeometrySnapshot>,
    /// Placements in the frame houses were computed in
    pub placements: Vec<BodyPlacement>,
    /// Aspects among bodies and the active Ascendant/Midheaven, orb-gated
    pub aspects: Vec<Aspect>,
    pub orb_profile: ProfileId,
    pub disclosure: String,
}

impl ChartReport {
    /// Snapshot houses were computed in
    pub fn active(&self) -> &GeometrySnapshot {
        self.relocated.as_ref().unwrap_or(&self.natal)
    }
}

/// Relocated geometry: birth instant, new place
pub fn relocate(
    natal: &GeometrySnapshot,
    relocation: &Relocation,
) -> Result<GeometrySnapshot, EngineError> {
    let location = relocation.location.with_normalized_longitude();
    tracing::debug!(
        latitude = location.latitude,
        longitude = location.longitude,
        house_system = natal.house_system.as_str(),
        "relocating chart"
    );
    geometry_at(natal.instant, location, natal.house_system)
}

/// Compute a chart report for a request
pub fn compute_chart(request: &ChartRequest) -> Result<ChartReport, EngineError> {
    compute_chart_with(&TzdbResolver, request)
}

pub fn compute_chart_with<R: CivilInstantResolver>(
    resolver: &R,
    request: &ChartRequest,
) -> Result<ChartReport, EngineError> {
    let natal = compute_geometry_with(resolver, &request.birth, request.house_system)?;
    let relocated = request
        .relocation
        .as_ref()
        .map(|r| relocate(&natal, r))
        .transpose()?;
    let active = relocated.as_ref().unwrap_or(&natal);

    if active.degenerate {
        tracing::warn!(
            latitude = active.location.latitude,
            "chart uses degenerate house cusps"
        );
    }

    let placements = place_bodies(active, &request.bodies)?;

    let profile_id = request
        .orb_profile
        .as_deref()
        .map(ProfileId::resolve)
        .unwrap_or_default();
    let mut points = request.bodies.clone();
    points.extend(active.aspect_angles());
    let aspects = orb_profile(profile_id).filter(&derive_aspects(&points)?);

    let disclosure = relocation_disclosure(request.relocation.as_ref(), active);

    Ok(ChartReport {
        natal,
        relocated,
        placements,
        aspects,
        orb_profile: profile_id,
        disclosure,
    })
}
