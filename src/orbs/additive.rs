//! Additive-modifier orb profiles
//!
//! Effective orb = base orb for the aspect type, plus a Moon bonus, plus an
//! outer-to-personal penalty, plus a luminary-to-angle bonus, clamped to the
//! profile's [min, max].

use super::{OrbProfile, OrbTable, ProfileId};
use crate::aspects::AspectType;
use crate::bodies;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdditiveModifiers {
    pub moon_bonus: f64,
    /// Negative; applied once for an outer/personal pair
    pub outer_to_personal_penalty: f64,
    pub luminary_to_angle_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveProfile {
    pub id: ProfileId,
    pub name: String,
    pub description: String,
    pub orbs: OrbTable,
    pub modifiers: AdditiveModifiers,
    pub min_orb: f64,
    pub max_orb: f64,
}

impl AdditiveProfile {
    /// `wm-spec-2025-09`
    pub fn balance_default() -> Self {
        Self {
            id: ProfileId::BalanceDefault,
            name: "Balance Default".to_string(),
            description: "Standard Balance Meter orbs optimized for symbolic weather".to_string(),
            orbs: OrbTable {
                conjunction: 8.0,
                opposition: 8.0,
                square: 7.0,
                trine: 7.0,
                sextile: 5.0,
                quincunx: 3.0,
                semisquare: 2.0,
                sesquiquadrate: 2.0,
                semisextile: 2.0,
                quintile: 1.0,
                biquintile: 1.0,
            },
            modifiers: AdditiveModifiers {
                moon_bonus: 1.0,
                outer_to_personal_penalty: -1.0,
                luminary_to_angle_bonus: 1.0,
            },
            min_orb: 0.0,
            max_orb: 10.0,
        }
    }

    /// `astro-seek-strict`
    pub fn astro_seek_strict() -> Self {
        Self {
            id: ProfileId::AstroSeekStrict,
            name: "Astro-Seek Strict".to_string(),
            description: "Tighter orbs to reduce false positives".to_string(),
            orbs: OrbTable {
                conjunction: 6.0,
                opposition: 6.0,
                square: 5.0,
                trine: 5.0,
                sextile: 4.0,
                quincunx: 2.0,
                semisquare: 1.5,
                sesquiquadrate: 1.5,
                semisextile: 1.5,
                quintile: 0.5,
                biquintile: 0.5,
            },
            modifiers: AdditiveModifiers {
                moon_bonus: 0.5,
                outer_to_personal_penalty: -1.5,
                luminary_to_angle_bonus: 0.0,
            },
            min_orb: 0.0,
            max_orb: 8.0,
        }
    }
}

impl OrbProfile for AdditiveProfile {
    fn id(&self) -> ProfileId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn effective_orb(&self, aspect: &AspectType, body_a: &str, body_b: &str) -> f64 {
        // Unknown types borrow the conjunction orb
        let mut orb = self.orbs.get(aspect).unwrap_or(self.orbs.conjunction);

        if bodies::is_moon(body_a) || bodies::is_moon(body_b) {
            orb += self.modifiers.moon_bonus;
        }

        let outer_personal = (bodies::is_outer(body_a) && bodies::is_personal(body_b))
            || (bodies::is_outer(body_b) && bodies::is_personal(body_a));
        if outer_personal {
            orb += self.modifiers.outer_to_personal_penalty;
        }

        let luminary = bodies::is_luminary(body_a) || bodies::is_luminary(body_b);
        let angle = bodies::is_angle(body_a) || bodies::is_angle(body_b);
        if luminary && angle {
            orb += self.modifiers.luminary_to_angle_bonus;
        }

        orb.clamp(self.min_orb, self.max_orb)
    }
}
