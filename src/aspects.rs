//! Aspect vocabulary and local aspect derivation
//!
//! External feeds spell aspect names many ways (`semi-square`, `sesquisquare`,
//! `inconjunct`, `opp`...). Everything is folded into [`AspectType`] at the
//! deserialization boundary; names that match nothing become
//! [`AspectType::Other`] and carry no weight downstream.

use crate::angles::{angular_separation, normalize_deg};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aspect type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AspectType {
    Conjunction,
    Semisextile,
    Semisquare,
    Sextile,
    Quintile,
    Square,
    Trine,
    Sesquiquadrate,
    Biquintile,
    Quincunx,
    Opposition,
    Other(String),
}

/// Support/friction class used by the weighting engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Supportive,
    Frictional,
    Neutral,
}

impl AspectType {
    /// The eleven known types in order of exact angle
    pub const KNOWN: [AspectType; 11] = [
        AspectType::Conjunction,
        AspectType::Semisextile,
        AspectType::Semisquare,
        AspectType::Sextile,
        AspectType::Quintile,
        AspectType::Square,
        AspectType::Trine,
        AspectType::Sesquiquadrate,
        AspectType::Biquintile,
        AspectType::Quincunx,
        AspectType::Opposition,
    ];

    /// Parse a name, accepting common synonyms
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match key.as_str() {
            "conjunction" | "conj" | "conjunct" => AspectType::Conjunction,
            "semisextile" => AspectType::Semisextile,
            "semisquare" | "octile" => AspectType::Semisquare,
            "sextile" | "sex" => AspectType::Sextile,
            "quintile" => AspectType::Quintile,
            "square" | "sq" => AspectType::Square,
            "trine" | "tri" => AspectType::Trine,
            "sesquiquadrate" | "sesquisquare" | "sesquare" | "trioctile" => {
                AspectType::Sesquiquadrate
            }
            "biquintile" => AspectType::Biquintile,
            "quincunx" | "inconjunct" => AspectType::Quincunx,
            "opposition" | "opp" | "opposite" => AspectType::Opposition,
            _ => AspectType::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Semisextile => "semisextile",
            AspectType::Semisquare => "semisquare",
            AspectType::Sextile => "sextile",
            AspectType::Quintile => "quintile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Sesquiquadrate => "sesquiquadrate",
            AspectType::Biquintile => "biquintile",
            AspectType::Quincunx => "quincunx",
            AspectType::Opposition => "opposition",
            AspectType::Other(name) => name,
        }
    }

    /// Exact separation in degrees; `None` for unknown types
    pub fn exact_angle(&self) -> Option<f64> {
        match self {
            AspectType::Conjunction => Some(0.0),
            AspectType::Semisextile => Some(30.0),
            AspectType::Semisquare => Some(45.0),
            AspectType::Sextile => Some(60.0),
            AspectType::Quintile => Some(72.0),
            AspectType::Square => Some(90.0),
            AspectType::Trine => Some(120.0),
            AspectType::Sesquiquadrate => Some(135.0),
            AspectType::Biquintile => Some(144.0),
            AspectType::Quincunx => Some(150.0),
            AspectType::Opposition => Some(180.0),
            AspectType::Other(_) => None,
        }
    }

    /// Conjunction is neutral; quintiles and the semisextile carry no class
    pub fn class(&self) -> AspectClass {
        match self {
            AspectType::Trine | AspectType::Sextile => AspectClass::Supportive,
            AspectType::Square
            | AspectType::Opposition
            | AspectType::Quincunx
            | AspectType::Semisquare
            | AspectType::Sesquiquadrate => AspectClass::Frictional,
            _ => AspectClass::Neutral,
        }
    }

    /// Conjunction, square, opposition
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            AspectType::Conjunction | AspectType::Square | AspectType::Opposition
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AspectType::Other(_))
    }
}

impl From<String> for AspectType {
    fn from(s: String) -> Self {
        AspectType::from_name(&s)
    }
}

impl From<&str> for AspectType {
    fn from(s: &str) -> Self {
        AspectType::from_name(s)
    }
}

impl From<AspectType> for String {
    fn from(a: AspectType) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the aspect is tightening or widening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectPhase {
    #[serde(alias = "↑", alias = "a")]
    Applying,
    #[serde(alias = "↓", alias = "s")]
    Separating,
    #[serde(other)]
    Unknown,
}

/// One aspect between two named bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    #[serde(rename = "p1_name", alias = "transit", alias = "body_a")]
    pub body_a: String,
    #[serde(rename = "p2_name", alias = "target", alias = "natal", alias = "body_b")]
    pub body_b: String,
    #[serde(rename = "aspect", alias = "aspect_type", alias = "type")]
    pub aspect_type: AspectType,
    /// Signed deviation from exact, degrees
    #[serde(alias = "orbit", alias = "orb_degrees", default)]
    pub orb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<AspectPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_potency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_potency: Option<f64>,
}

impl Aspect {
    pub fn new(
        body_a: impl Into<String>,
        body_b: impl Into<String>,
        aspect_type: impl Into<AspectType>,
        orb: f64,
    ) -> Self {
        Self {
            body_a: body_a.into(),
            body_b: body_b.into(),
            aspect_type: aspect_type.into(),
            orb,
            phase: None,
            transit_potency: None,
            target_potency: None,
        }
    }

    pub fn with_phase(mut self, phase: AspectPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_potency(mut self, transit: f64, target: f64) -> Self {
        self.transit_potency = Some(transit);
        self.target_potency = Some(target);
        self
    }
}

/// A body placed on the ecliptic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyLongitude {
    pub name: String,
    pub longitude: f64,
}

impl BodyLongitude {
    pub fn new(name: impl Into<String>, longitude: f64) -> Self {
        Self {
            name: name.into(),
            longitude,
        }
    }
}

/// Closest known aspect between two longitudes.
///
/// The orb is `separation − exact angle`, so negative means inside exact.
/// Ties go to the lower exact angle.
pub fn derive_aspect(a: &BodyLongitude, b: &BodyLongitude) -> Result<Aspect, EngineError> {
    for body in [a, b] {
        if !body.longitude.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "longitude for {} must be finite",
                body.name
            )));
        }
    }

    let separation = angular_separation(normalize_deg(a.longitude), normalize_deg(b.longitude));
    let mut best = (AspectType::Conjunction, separation);
    for aspect in AspectType::KNOWN.iter().skip(1) {
        if let Some(exact) = aspect.exact_angle() {
            let orb = separation - exact;
            if orb.abs() < best.1.abs() {
                best = (aspect.clone(), orb);
            }
        }
    }

    Ok(Aspect::new(a.name.clone(), b.name.clone(), best.0, best.1))
}

/// Closest aspect for every unordered pair, in input order
pub fn derive_aspects(bodies: &[BodyLongitude]) -> Result<Vec<Aspect>, EngineError> {
    let mut aspects = Vec::with_capacity(bodies.len() * bodies.len().saturating_sub(1) / 2);
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            aspects.push(derive_aspect(a, b)?);
        }
    }
    tracing::debug!(bodies = bodies.len(), aspects = aspects.len(), "derived aspects");
    Ok(aspects)
}
