//! Orb profiles
//!
//! An orb profile decides how far from exact an aspect may be and still
//! count. Two resolution strategies exist side by side:
//! - additive modifiers on a base orb ([`AdditiveProfile`])
//! - per-pair caps with point discipline ([`PairCapProfile`])
//!
//! Profiles are plain data; behavior lives in the trait implementations and
//! is selected by [`orb_profile`] from a [`ProfileId`].

mod additive;
mod pair_cap;

pub use additive::AdditiveProfile;
pub use pair_cap::PairCapProfile;

use crate::aspects::{Aspect, AspectType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known profile identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileId {
    #[default]
    #[serde(rename = "wm-spec-2025-09")]
    BalanceDefault,
    #[serde(rename = "wm-tight-2025-11-v5")]
    TightV5,
    #[serde(rename = "astro-seek-strict")]
    AstroSeekStrict,
}

impl ProfileId {
    pub const ALL: [ProfileId; 3] = [
        ProfileId::BalanceDefault,
        ProfileId::TightV5,
        ProfileId::AstroSeekStrict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileId::BalanceDefault => "wm-spec-2025-09",
            ProfileId::TightV5 => "wm-tight-2025-11-v5",
            ProfileId::AstroSeekStrict => "astro-seek-strict",
        }
    }

    /// Resolve an id string; unknown ids fall back to `wm-spec-2025-09`
    pub fn resolve(id: &str) -> Self {
        let trimmed = id.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| {
                tracing::debug!(profile = trimmed, "unknown orb profile, using default");
                ProfileId::default()
            })
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base orb (or cap) per known aspect type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbTable {
    pub conjunction: f64,
    pub opposition: f64,
    pub square: f64,
    pub trine: f64,
    pub sextile: f64,
    pub quincunx: f64,
    pub semisquare: f64,
    pub sesquiquadrate: f64,
    pub semisextile: f64,
    pub quintile: f64,
    pub biquintile: f64,
}

impl OrbTable {
    pub fn get(&self, aspect: &AspectType) -> Option<f64> {
        match aspect {
            AspectType::Conjunction => Some(self.conjunction),
            AspectType::Opposition => Some(self.opposition),
            AspectType::Square => Some(self.square),
            AspectType::Trine => Some(self.trine),
            AspectType::Sextile => Some(self.sextile),
            AspectType::Quincunx => Some(self.quincunx),
            AspectType::Semisquare => Some(self.semisquare),
            AspectType::Sesquiquadrate => Some(self.sesquiquadrate),
            AspectType::Semisextile => Some(self.semisextile),
            AspectType::Quintile => Some(self.quintile),
            AspectType::Biquintile => Some(self.biquintile),
            AspectType::Other(_) => None,
        }
    }
}

/// An orb policy
pub trait OrbProfile: Send + Sync {
    fn id(&self) -> ProfileId;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Largest |orb| (degrees, ≥ 0) at which `aspect` between the two bodies counts
    fn effective_orb(&self, aspect: &AspectType, body_a: &str, body_b: &str) -> f64;

    fn is_within_orb(&self, aspect: &Aspect) -> bool {
        aspect.orb.is_finite()
            && aspect.orb.abs()
                <= self.effective_orb(&aspect.aspect_type, &aspect.body_a, &aspect.body_b)
    }

    /// Keep aspects within orb, preserving order
    fn filter(&self, aspects: &[Aspect]) -> Vec<Aspect> {
        aspects
            .iter()
            .filter(|a| self.is_within_orb(a))
            .cloned()
            .collect()
    }
}

/// Build the profile for an id
pub fn orb_profile(id: ProfileId) -> Box<dyn OrbProfile> {
    match id {
        ProfileId::BalanceDefault => Box::new(AdditiveProfile::balance_default()),
        ProfileId::AstroSeekStrict => Box::new(AdditiveProfile::astro_seek_strict()),
        ProfileId::TightV5 => Box::new(PairCapProfile::tight_v5()),
    }
}

/// Effective orb by profile id string
pub fn effective_orb(aspect: &AspectType, body_a: &str, body_b: &str, profile_id: &str) -> f64 {
    orb_profile(ProfileId::resolve(profile_id)).effective_orb(aspect, body_a, body_b)
}

pub fn is_within_orb(aspect: &Aspect, profile_id: &str) -> bool {
    orb_profile(ProfileId::resolve(profile_id)).is_within_orb(aspect)
}

pub fn filter_by_orb_profile(aspects: &[Aspect], profile_id: &str) -> Vec<Aspect> {
    orb_profile(ProfileId::resolve(profile_id)).filter(aspects)
}

/// Catalogue entry for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub fn available_profiles() -> Vec<ProfileSummary> {
    ProfileId::ALL
        .into_iter()
        .map(|id| {
            let profile = orb_profile(id);
            ProfileSummary {
                id: id.as_str().to_string(),
                name: profile.name().to_string(),
                description: profile.description().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        assert_eq!(ProfileId::resolve("astro-seek-strict"), ProfileId::AstroSeekStrict);
        assert_eq!(ProfileId::resolve("wm-tight-2025-11-v5"), ProfileId::TightV5);
        assert_eq!(ProfileId::resolve("no-such-profile"), ProfileId::BalanceDefault);
        assert_eq!(ProfileId::resolve(""), ProfileId::BalanceDefault);
    }

    #[test]
    fn test_profile_id_wire_name() {
        let json = serde_json::to_string(&ProfileId::TightV5).unwrap();
        assert_eq!(json, "\"wm-tight-2025-11-v5\"");
    }

    #[test]
    fn test_factory_matches_id() {
        for id in ProfileId::ALL {
            assert_eq!(orb_profile(id).id(), id);
        }
    }

    #[test]
    fn test_unknown_profile_uses_default_orbs() {
        let conj = AspectType::Conjunction;
        assert_eq!(
            effective_orb(&conj, "Venus", "Mars", "bogus"),
            effective_orb(&conj, "Venus", "Mars", "wm-spec-2025-09")
        );
    }

    #[test]
    fn test_within_orb_uses_absolute_value() {
        let aspect = Aspect::new("Mars", "Venus", "square", -3.5);
        assert!(is_within_orb(&aspect, "wm-spec-2025-09"));
        let wide = Aspect::new("Mars", "Venus", "square", -7.5);
        assert!(!is_within_orb(&wide, "wm-spec-2025-09"));
        let nan = Aspect::new("Mars", "Venus", "square", f64::NAN);
        assert!(!is_within_orb(&nan, "wm-spec-2025-09"));
    }

    #[test]
    fn test_filter_preserves_order() {
        let aspects = vec![
            Aspect::new("Sun", "Moon", "trine", 1.0),
            Aspect::new("Mercury", "Venus", "sextile", 4.5),
            Aspect::new("Mars", "Venus", "square", 2.0),
            Aspect::new("Sun", "Jupiter", "trine", 6.0),
        ];
        let balance = filter_by_orb_profile(&aspects, "wm-spec-2025-09");
        assert_eq!(balance.len(), 4);

        let strict = filter_by_orb_profile(&aspects, "astro-seek-strict");
        let kept: Vec<&str> = strict.iter().map(|a| a.body_a.as_str()).collect();
        assert_eq!(kept, vec!["Sun", "Mars"]);
    }

    #[test]
    fn test_catalogue_lists_all_profiles() {
        let profiles = available_profiles();
        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["wm-spec-2025-09", "wm-tight-2025-11-v5", "astro-seek-strict"]
        );
        assert!(profiles.iter().all(|p| !p.name.is_empty()));
    }
}
