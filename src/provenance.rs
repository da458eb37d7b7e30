//! Input provenance
//!
//! The hash covers only the normalized inputs: dates canonicalized in their
//! own timezone and numerics rounded to six decimals. Engine build, run id and
//! export time are recorded alongside but never hashed, so identical inputs
//! hash identically across engine versions.

use crate::aspects::{Aspect, AspectPhase, AspectType};
use crate::error::EngineError;
use crate::scaling::round_half_up;
use crate::time::parse_timezone;
use crate::types::DayMetricsInput;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const HASH_DECIMALS: i32 = 6;

/// Run identifiers attached to a render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub engine_build: String,
    pub dataset_id: String,
    pub run_id: String,
    pub export_timestamp: String,
}

/// Caller-supplied provenance; unset fields are filled at render time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceConfig {
    #[serde(default)]
    pub engine_build: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub export_timestamp: Option<String>,
}

impl ProvenanceConfig {
    pub fn resolve(&self) -> Provenance {
        Provenance {
            engine_build: self
                .engine_build
                .clone()
                .unwrap_or_else(|| crate::ENGINE_BUILD.to_string()),
            dataset_id: self.dataset_id.clone().unwrap_or_else(|| "unknown".to_string()),
            run_id: self
                .run_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            export_timestamp: self
                .export_timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// ISO calendar date of `date` as seen in `timezone`.
///
/// Accepts a bare date, an RFC 3339 timestamp (converted into the zone), or a
/// naive datetime (read as wall time in the zone).
pub fn canonicalize_date(date: &str, timezone: &str) -> Result<String, EngineError> {
    let tz = parse_timezone(timezone)?;
    let trimmed = date.trim();

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&tz).format("%Y-%m-%d").to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            let local = tz
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| {
                    EngineError::DateParseError(format!("{trimmed} does not exist in {timezone}"))
                })?;
            return Ok(local.format("%Y-%m-%d").to_string());
        }
    }

    Err(EngineError::DateParseError(format!(
        "invalid date for symbolic weather: {date}"
    )))
}

/// One aspect as it enters the hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashAspect {
    pub aspect: AspectType,
    pub body_a: String,
    pub body_b: String,
    pub orb: f64,
    pub transit_potency: Option<f64>,
    pub target_potency: Option<f64>,
    pub phase: Option<AspectPhase>,
}

impl HashAspect {
    pub fn from_aspect(aspect: &Aspect) -> Self {
        let r = |v: f64| round_half_up(v, HASH_DECIMALS);
        Self {
            aspect: aspect.aspect_type.clone(),
            body_a: aspect.body_a.clone(),
            body_b: aspect.body_b.clone(),
            orb: r(aspect.orb),
            transit_potency: aspect.transit_potency.map(r),
            target_potency: aspect.target_potency.map(r),
            phase: aspect.phase,
        }
    }
}

/// One normalized record as it enters the hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    pub date: String,
    pub timezone: String,
    pub magnitude: f64,
    pub directional_bias: f64,
    pub volatility: f64,
    pub coherence: f64,
    pub sfd: Option<f64>,
    pub sfd_pre_scaled: bool,
    /// Aspects that reached the weighting stage, after any orb gating
    pub aspects: Vec<HashAspect>,
}

impl HashRecord {
    pub fn from_day(
        day: &DayMetricsInput,
        canonical_date: &str,
        timezone: &str,
        weighted_aspects: &[Aspect],
    ) -> Self {
        let r = |v: f64| round_half_up(v, HASH_DECIMALS);
        Self {
            date: canonical_date.to_string(),
            timezone: timezone.to_string(),
            magnitude: r(day.magnitude),
            directional_bias: r(day.directional_bias),
            volatility: r(day.volatility.unwrap_or(0.0)),
            coherence: r(day.coherence.unwrap_or(0.0)),
            sfd: day.sfd.filter(|v| v.is_finite()).map(r),
            sfd_pre_scaled: day.sfd_pre_scaled,
            aspects: weighted_aspects.iter().map(HashAspect::from_aspect).collect(),
        }
    }
}

/// `sha256:<hex>` over the JSON array of records
pub fn hash_normalized_input(records: &[HashRecord]) -> Result<String, EngineError> {
    let json = serde_json::to_string(records)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: &DayMetricsInput) -> HashRecord {
        let date = canonicalize_date(&day.date, "America/Chicago").unwrap();
        HashRecord::from_day(day, &date, "America/Chicago", &day.aspects)
    }

    #[test]
    fn test_canonicalize_bare_date() {
        assert_eq!(canonicalize_date("2025-01-05", "America/Chicago").unwrap(), "2025-01-05");
    }

    #[test]
    fn test_canonicalize_instant_into_zone() {
        // 03:00Z on the 5th is still the 4th in Chicago
        assert_eq!(
            canonicalize_date("2025-01-05T03:00:00Z", "America/Chicago").unwrap(),
            "2025-01-04"
        );
        assert_eq!(
            canonicalize_date("2025-01-05T03:00:00Z", "Asia/Tokyo").unwrap(),
            "2025-01-05"
        );
    }

    #[test]
    fn test_canonicalize_naive_datetime() {
        assert_eq!(
            canonicalize_date("2025-01-05T23:30", "America/Chicago").unwrap(),
            "2025-01-05"
        );
    }

    #[test]
    fn test_canonicalize_rejects_garbage() {
        assert!(matches!(
            canonicalize_date("yesterday", "America/Chicago"),
            Err(EngineError::DateParseError(_))
        ));
        assert!(matches!(
            canonicalize_date("2025-01-05", "Nowhere/Special"),
            Err(EngineError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_hash_is_stable() {
        let day = DayMetricsInput::new("2025-01-05", 0.04, -0.02).with_volatility(0.01);
        let a = hash_normalized_input(&[record(&day)]).unwrap();
        let b = hash_normalized_input(&[record(&day.clone())]).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_hash_changes_with_any_field() {
        let base = DayMetricsInput::new("2025-01-05", 0.04, -0.02).with_volatility(0.01);
        let h0 = hash_normalized_input(&[record(&base)]).unwrap();

        let variants = [
            DayMetricsInput { date: "2025-01-06".into(), ..base.clone() },
            DayMetricsInput { magnitude: 0.041, ..base.clone() },
            DayMetricsInput { directional_bias: -0.021, ..base.clone() },
            DayMetricsInput { volatility: Some(0.02), ..base.clone() },
            DayMetricsInput { coherence: Some(0.5), ..base.clone() },
            DayMetricsInput { sfd: Some(0.01), ..base.clone() },
            DayMetricsInput { sfd: Some(0.05), sfd_pre_scaled: true, ..base.clone() },
            base.clone().with_aspects(vec![Aspect::new("Venus", "Jupiter", "trine", 1.0)]),
        ];
        for v in &variants {
            assert_ne!(hash_normalized_input(&[record(v)]).unwrap(), h0, "{v:?}");
        }

        let other_zone = HashRecord::from_day(&base, "2025-01-05", "Asia/Tokyo", &[]);
        assert_ne!(hash_normalized_input(&[other_zone]).unwrap(), h0);
    }

    #[test]
    fn test_hash_separates_pre_scaled_flag() {
        let plain = DayMetricsInput::new("2025-01-05", 0.04, -0.02).with_sfd(0.05, false);
        let flagged = plain.clone().with_sfd(0.05, true);
        assert_ne!(
            hash_normalized_input(&[record(&plain)]).unwrap(),
            hash_normalized_input(&[record(&flagged)]).unwrap()
        );
    }

    #[test]
    fn test_hash_separates_aspect_lists() {
        let base = DayMetricsInput::new("2025-01-05", 0.04, -0.02).with_volatility(0.01);
        let trine = base
            .clone()
            .with_aspects(vec![Aspect::new("Venus", "Jupiter", "trine", 1.0)]);
        let variants = [
            base.clone()
                .with_aspects(vec![Aspect::new("Venus", "Jupiter", "square", 1.0)]),
            base.clone()
                .with_aspects(vec![Aspect::new("Venus", "Saturn", "trine", 1.0)]),
            base.clone()
                .with_aspects(vec![Aspect::new("Venus", "Jupiter", "trine", 1.5)]),
            base.clone().with_aspects(vec![
                Aspect::new("Venus", "Jupiter", "trine", 1.0).with_potency(0.5, 1.0)
            ]),
            base.clone().with_aspects(vec![
                Aspect::new("Venus", "Jupiter", "trine", 1.0).with_phase(AspectPhase::Applying)
            ]),
        ];
        let h0 = hash_normalized_input(&[record(&trine)]).unwrap();
        for v in &variants {
            assert_ne!(hash_normalized_input(&[record(v)]).unwrap(), h0, "{v:?}");
        }
    }

    #[test]
    fn test_hash_aspect_spelling_is_canonical() {
        let base = DayMetricsInput::new("2025-01-05", 0.04, -0.02);
        let a = base
            .clone()
            .with_aspects(vec![Aspect::new("Mars", "Saturn", "semi-square", 0.4)]);
        let b = base.with_aspects(vec![Aspect::new("Mars", "Saturn", "semisquare", 0.4)]);
        assert_eq!(
            hash_normalized_input(&[record(&a)]).unwrap(),
            hash_normalized_input(&[record(&b)]).unwrap()
        );
    }

    #[test]
    fn test_hash_ignores_noise_below_six_decimals() {
        let a = DayMetricsInput::new("2025-01-05", 0.04, -0.02);
        let b = DayMetricsInput::new("2025-01-05", 0.040_000_000_1, -0.02);
        assert_eq!(
            hash_normalized_input(&[record(&a)]).unwrap(),
            hash_normalized_input(&[record(&b)]).unwrap()
        );
    }

    #[test]
    fn test_empty_batch_hash() {
        let h = hash_normalized_input(&[]).unwrap();
        // sha256 of "[]"
        assert_eq!(
            h,
            "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }

    #[test]
    fn test_provenance_defaults_filled() {
        let p = ProvenanceConfig::default().resolve();
        assert!(Uuid::parse_str(&p.run_id).is_ok());
        assert_eq!(p.dataset_id, "unknown");
        assert!(DateTime::parse_from_rfc3339(&p.export_timestamp).is_ok());

        let fixed = ProvenanceConfig {
            run_id: Some("run-1".into()),
            ..Default::default()
        };
        assert_eq!(fixed.resolve().run_id, "run-1");
    }
}
