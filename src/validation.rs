//! Named validation rules for per-day input
//!
//! Errors stop a render; warnings are carried into the observability
//! snapshot and never block output.

use crate::types::{CoherenceSource, DayMetricsInput};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unflagged engine SFD values larger than this look pre-scaled
pub const SFD_PRE_SCALED_HINT: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationRule {
    NonFiniteValue,
    MissingCoherenceSource,
    SfdScaleAmbiguous,
}

impl ValidationRule {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationRule::NonFiniteValue => Severity::Error,
            ValidationRule::MissingCoherenceSource | ValidationRule::SfdScaleAmbiguous => {
                Severity::Warning
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule: ValidationRule,
    pub severity: Severity,
    pub date: String,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(rule: ValidationRule, day: &DayMetricsInput, field: &str, message: String) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            date: day.date.clone(),
            field: field.to_string(),
            message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} on {} ({}): {}", self.rule, self.date, self.field, self.message)
    }
}

fn check_finite(
    issues: &mut Vec<ValidationIssue>,
    day: &DayMetricsInput,
    field: &str,
    value: Option<f64>,
) {
    if let Some(v) = value.filter(|v| !v.is_finite()) {
        issues.push(ValidationIssue::new(
            ValidationRule::NonFiniteValue,
            day,
            field,
            format!("{field} must be finite, got {v}"),
        ));
    }
}

/// Apply every rule to one day
pub fn validate_day(day: &DayMetricsInput, coherence_from: CoherenceSource) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_finite(&mut issues, day, "magnitude", Some(day.magnitude));
    check_finite(&mut issues, day, "directional_bias", Some(day.directional_bias));
    check_finite(&mut issues, day, "volatility", day.volatility);
    check_finite(&mut issues, day, "coherence", day.coherence);
    check_finite(&mut issues, day, "sfd", day.sfd);
    for (i, aspect) in day.aspects.iter().enumerate() {
        check_finite(&mut issues, day, &format!("aspects[{i}].orb"), Some(aspect.orb));
        check_finite(
            &mut issues,
            day,
            &format!("aspects[{i}].transit_potency"),
            aspect.transit_potency,
        );
        check_finite(
            &mut issues,
            day,
            &format!("aspects[{i}].target_potency"),
            aspect.target_potency,
        );
    }

    let source_value = match coherence_from {
        CoherenceSource::Volatility => day.volatility,
        CoherenceSource::Coherence => day.coherence,
    };
    if source_value.is_none() {
        issues.push(ValidationIssue::new(
            ValidationRule::MissingCoherenceSource,
            day,
            coherence_from.as_str(),
            format!("{} absent; treated as 0", coherence_from.as_str()),
        ));
    }

    if let Some(sfd) = day.sfd.filter(|v| v.is_finite()) {
        if !day.sfd_pre_scaled && sfd.abs() > SFD_PRE_SCALED_HINT {
            issues.push(ValidationIssue::new(
                ValidationRule::SfdScaleAmbiguous,
                day,
                "sfd",
                format!(
                    "|sfd| = {} exceeds {SFD_PRE_SCALED_HINT} without sfd_pre_scaled; scaling ×10 anyway",
                    sfd.abs()
                ),
            ));
        }
    }

    issues
}

/// Issues across a batch, in day order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

pub fn validate_batch(days: &[DayMetricsInput], coherence_from: CoherenceSource) -> ValidationReport {
    ValidationReport {
        issues: days
            .iter()
            .flat_map(|day| validate_day(day, coherence_from))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::Aspect;

    fn clean_day() -> DayMetricsInput {
        DayMetricsInput::new("2025-03-01", 0.04, -0.01).with_volatility(0.02)
    }

    #[test]
    fn test_clean_day_has_no_issues() {
        assert!(validate_day(&clean_day(), CoherenceSource::Volatility).is_empty());
    }

    #[test]
    fn test_non_finite_is_error() {
        let mut day = clean_day();
        day.magnitude = f64::NAN;
        day.aspects = vec![Aspect::new("Sun", "Moon", "trine", f64::INFINITY)];
        let issues = validate_day(&day, CoherenceSource::Volatility);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.rule == ValidationRule::NonFiniteValue));
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert_eq!(issues[1].field, "aspects[0].orb");
    }

    #[test]
    fn test_missing_coherence_source_follows_mode() {
        let day = clean_day();
        let issues = validate_day(&day, CoherenceSource::Coherence);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, ValidationRule::MissingCoherenceSource);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].field, "coherence");
    }

    #[test]
    fn test_sfd_scale_ambiguity() {
        let day = clean_day().with_sfd(0.4, false);
        let issues = validate_day(&day, CoherenceSource::Volatility);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, ValidationRule::SfdScaleAmbiguous);

        let flagged = clean_day().with_sfd(0.4, true);
        assert!(validate_day(&flagged, CoherenceSource::Volatility).is_empty());

        let small = clean_day().with_sfd(0.1, false);
        assert!(validate_day(&small, CoherenceSource::Volatility).is_empty());
    }

    #[test]
    fn test_batch_report() {
        let mut bad = clean_day();
        bad.directional_bias = f64::NEG_INFINITY;
        let report = validate_batch(
            &[clean_day(), bad, clean_day().with_sfd(-0.5, false)],
            CoherenceSource::Volatility,
        );
        assert!(report.has_errors());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
    }
}
