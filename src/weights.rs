//! Support/Friction Differential
//!
//! Each aspect contributes `base weight × orb falloff × potency × modifier`
//! to either the supportive or the frictional sum. Conjunctions and
//! unclassified types contribute to neither.
//!
//! SFD = (S − F) / (S + F). When both sums are zero there is no signal and the
//! result is `None`; a balanced signal is `Some(0.0)`.

use crate::aspects::{Aspect, AspectClass, AspectType};
use crate::bodies;
use serde::{Deserialize, Serialize};

const ANGLE_MODIFIER: f64 = 1.2;
const SELF_FRICTION_MODIFIER: f64 = 0.8;
const MAJOR_ORB_CAP: f64 = 3.0;
const MINOR_ORB_CAP: f64 = 1.0;

/// Base weight before falloff and modifiers; zero for neutral types
pub fn base_weight(aspect: &AspectType) -> f64 {
    match aspect {
        AspectType::Trine => 1.0,
        AspectType::Sextile => 0.8,
        AspectType::Square => 1.0,
        AspectType::Opposition => 1.0,
        AspectType::Quincunx => 0.6,
        AspectType::Semisquare => 0.6,
        AspectType::Sesquiquadrate => 0.6,
        _ => 0.0,
    }
}

/// Orb at which the weight decays to zero
pub fn orb_cap(aspect: &AspectType) -> f64 {
    match aspect {
        AspectType::Trine | AspectType::Sextile | AspectType::Square | AspectType::Opposition => {
            MAJOR_ORB_CAP
        }
        _ => MINOR_ORB_CAP,
    }
}

/// Linear falloff, 1 at exact and 0 at the cap
pub fn orb_falloff(aspect: &AspectType, orb: f64) -> f64 {
    if !orb.is_finite() {
        return 0.0;
    }
    (1.0 - orb.abs() / orb_cap(aspect)).clamp(0.0, 1.0)
}

/// Weight of one aspect, ≥ 0
pub fn aspect_weight(aspect: &Aspect) -> f64 {
    let base = base_weight(&aspect.aspect_type);
    if base <= 0.0 {
        return 0.0;
    }
    let falloff = orb_falloff(&aspect.aspect_type, aspect.orb);
    if falloff <= 0.0 {
        return 0.0;
    }

    let potency = aspect.transit_potency.unwrap_or(1.0) * aspect.target_potency.unwrap_or(1.0);
    let potency = if potency.is_finite() { potency.max(0.0) } else { 0.0 };

    let mut modifier = 1.0;
    if bodies::is_angle(&aspect.body_a) || bodies::is_angle(&aspect.body_b) {
        modifier *= ANGLE_MODIFIER;
    }
    if aspect.body_a == aspect.body_b && aspect.aspect_type.class() == AspectClass::Frictional {
        modifier *= SELF_FRICTION_MODIFIER;
    }

    base * falloff * potency * modifier
}

/// Supportive/frictional sums for one day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SfdSums {
    pub supportive: f64,
    pub frictional: f64,
}

impl SfdSums {
    pub fn total(&self) -> f64 {
        self.supportive + self.frictional
    }

    pub fn has_signal(&self) -> bool {
        self.total() > 0.0
    }

    /// Raw differential in [-1, 1]; `None` when there is no signal
    pub fn differential(&self) -> Option<f64> {
        self.has_signal()
            .then(|| (self.supportive - self.frictional) / self.total())
    }
}

/// Accumulate weights over an aspect list
pub fn weigh_aspects(aspects: &[Aspect]) -> SfdSums {
    aspects.iter().fold(SfdSums::default(), |mut sums, aspect| {
        let weight = aspect_weight(aspect);
        if weight > 0.0 {
            match aspect.aspect_type.class() {
                AspectClass::Supportive => sums.supportive += weight,
                AspectClass::Frictional => sums.frictional += weight,
                AspectClass::Neutral => {}
            }
        }
        sums
    })
}

/// SFD for an aspect list; `None` when nothing carries weight
pub fn support_friction_differential(aspects: &[Aspect]) -> Option<f64> {
    weigh_aspects(aspects).differential()
}
