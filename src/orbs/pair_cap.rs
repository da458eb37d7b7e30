//! Per-pair-cap orb profile
//!
//! Each aspect type has a tight cap. Hard aspects touching a luminary get a
//! small extension, but only between physical bodies; once a calculated point
//! or an angle is involved, hard caps tighten and soft caps drop to a fixed
//! ceiling.

use super::{OrbProfile, OrbTable, ProfileId};
use crate::aspects::AspectType;
use crate::bodies;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCapProfile {
    pub id: ProfileId,
    pub name: String,
    pub description: String,
    pub caps: OrbTable,
    /// Cap for aspect types missing from the table
    pub fallback_cap: f64,
    pub luminary_hard_bonus: f64,
    /// Negative; hard aspects with a point
    pub point_hard_adjustment: f64,
    /// Ceiling for trine/sextile with a point
    pub point_soft_major_ceiling: f64,
    /// Ceiling for the remaining soft aspects with a point
    pub point_soft_minor_ceiling: f64,
    pub max_orb: f64,
}

impl PairCapProfile {
    /// `wm-tight-2025-11-v5`
    pub fn tight_v5() -> Self {
        Self {
            id: ProfileId::TightV5,
            name: "Tight Discipline v5".to_string(),
            description: "Per-pair caps with point discipline for symbolic weather".to_string(),
            caps: OrbTable {
                conjunction: 3.5,
                opposition: 4.0,
                square: 4.0,
                trine: 3.0,
                sextile: 1.0,
                quincunx: 1.0,
                semisquare: 0.8,
                sesquiquadrate: 0.8,
                semisextile: 0.5,
                quintile: 0.5,
                biquintile: 0.5,
            },
            fallback_cap: 1.0,
            luminary_hard_bonus: 0.5,
            point_hard_adjustment: -0.5,
            point_soft_major_ceiling: 1.0,
            point_soft_minor_ceiling: 0.5,
            max_orb: 4.5,
        }
    }
}

impl OrbProfile for PairCapProfile {
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
        let mut cap = self.caps.get(aspect).unwrap_or(self.fallback_cap);
        let point = bodies::is_point(body_a) || bodies::is_point(body_b);
        let luminary = bodies::is_luminary(body_a) || bodies::is_luminary(body_b);

        if aspect.is_hard() {
            if point {
                cap += self.point_hard_adjustment;
            } else if luminary {
                cap += self.luminary_hard_bonus;
            }
        } else if point && aspect.is_known() {
            let ceiling = match aspect {
                AspectType::Trine | AspectType::Sextile => self.point_soft_major_ceiling,
                _ => self.point_soft_minor_ceiling,
            };
            cap = cap.min(ceiling);
        }

        cap.clamp(0.0, self.max_orb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::Aspect;

    fn tight() -> PairCapProfile {
        PairCapProfile::tight_v5()
    }

    #[test]
    fn test_base_caps() {
        let p = tight();
        assert_eq!(p.effective_orb(&AspectType::Conjunction, "Venus", "Mars"), 3.5);
        assert_eq!(p.effective_orb(&AspectType::Square, "Venus", "Mars"), 4.0);
        assert_eq!(p.effective_orb(&AspectType::Trine, "Venus", "Mars"), 3.0);
        assert_eq!(p.effective_orb(&AspectType::Semisextile, "Venus", "Mars"), 0.5);
    }

    #[test]
    fn test_luminary_hard_exception() {
        let p = tight();
        assert_eq!(p.effective_orb(&AspectType::Conjunction, "Moon", "Venus"), 4.0);
        assert_eq!(p.effective_orb(&AspectType::Opposition, "Sun", "Saturn"), 4.5);
        // soft aspects get no luminary extension
        assert_eq!(p.effective_orb(&AspectType::Trine, "Sun", "Jupiter"), 3.0);
    }

    #[test]
    fn test_point_blocks_luminary_exception_and_tightens() {
        let p = tight();
        assert_eq!(p.effective_orb(&AspectType::Conjunction, "Sun", "Mean_Node"), 3.0);
        assert_eq!(p.effective_orb(&AspectType::Square, "Moon", "Chiron"), 3.5);
        assert_eq!(p.effective_orb(&AspectType::Opposition, "Sun", "Ascendant"), 3.5);
    }

    #[test]
    fn test_point_soft_ceilings() {
        let p = tight();
        assert_eq!(p.effective_orb(&AspectType::Trine, "Venus", "True_Lilith"), 1.0);
        assert_eq!(p.effective_orb(&AspectType::Sextile, "Venus", "MC"), 1.0);
        assert_eq!(p.effective_orb(&AspectType::Quincunx, "Mars", "Chiron"), 0.5);
        assert_eq!(p.effective_orb(&AspectType::Semisquare, "Mars", "Vertex"), 0.5);
        assert_eq!(p.effective_orb(&AspectType::Quintile, "Mars", "Vertex"), 0.5);
    }

    #[test]
    fn test_unknown_aspect_fallback() {
        let p = tight();
        assert_eq!(p.effective_orb(&AspectType::from_name("novile"), "Venus", "Mars"), 1.0);
    }

    #[test]
    fn test_absolute_max() {
        let mut p = tight();
        p.caps.opposition = 6.0;
        assert_eq!(p.effective_orb(&AspectType::Opposition, "Sun", "Saturn"), 4.5);
    }

    #[test]
    fn test_filter_under_tight_caps() {
        let aspects = vec![
            Aspect::new("Sun", "Saturn", "opposition", 4.4),
            Aspect::new("Venus", "Chiron", "trine", 1.2),
            Aspect::new("Mars", "Jupiter", "sextile", -0.9),
        ];
        let kept = tight().filter(&aspects);
        let pairs: Vec<&str> = kept.iter().map(|a| a.body_b.as_str()).collect();
        assert_eq!(pairs, vec!["Saturn", "Jupiter"]);
    }
}
