//! Batch observability
//!
//! Per-day audit traces, per-bound clamp counters and threshold alerts.
//! Alerts are monitoring signals only; they never block output.

use crate::scaling::{Axis, ClampBound, ScaledAxis, SfdEvidence};
use crate::types::SfdSource;
use crate::validation::ValidationIssue;
use serde::{Deserialize, Serialize};

/// Clamp-rate thresholds (fraction of days) above which an alert is raised
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub magnitude: f64,
    pub directional_bias: f64,
    pub coherence: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            magnitude: 0.20,
            directional_bias: 0.10,
            coherence: 0.20,
        }
    }
}

impl AlertThresholds {
    fn for_axis(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Magnitude => Some(self.magnitude),
            Axis::DirectionalBias => Some(self.directional_bias),
            Axis::Coherence => Some(self.coherence),
            Axis::Sfd => None,
        }
    }
}

/// Audit record of one numeric axis on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTrace {
    pub date: String,
    pub axis: Axis,
    pub normalized: f64,
    pub scaled: f64,
    pub clamped: f64,
    pub rounded: f64,
    pub transform: String,
}

impl AxisTrace {
    pub fn new(date: &str, scaled: &ScaledAxis, transform: &str) -> Self {
        Self {
            date: date.to_string(),
            axis: scaled.axis,
            normalized: scaled.normalized,
            scaled: scaled.scaled,
            clamped: scaled.clamped,
            rounded: scaled.rounded,
            transform: transform.to_string(),
        }
    }
}

/// Audit record of the SFD axis on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfdTrace {
    pub date: String,
    pub supportive_sum: Option<f64>,
    pub frictional_sum: Option<f64>,
    pub score_raw: Option<f64>,
    pub scaled: Option<f64>,
    pub clamped: Option<f64>,
    pub rounded: Option<f64>,
    pub display: String,
    pub reason: SfdSource,
}

impl SfdTrace {
    pub fn new(
        date: &str,
        scaled: Option<&ScaledAxis>,
        evidence: &SfdEvidence,
        display: &str,
    ) -> Self {
        let sums = match evidence {
            SfdEvidence::Aspects { sums } => Some(*sums),
            _ => None,
        };
        Self {
            date: date.to_string(),
            supportive_sum: sums.map(|s| s.supportive),
            frictional_sum: sums.map(|s| s.frictional),
            score_raw: scaled.map(|s| s.scaled),
            scaled: scaled.map(|s| s.scaled),
            clamped: scaled.map(|s| s.clamped),
            rounded: scaled.map(|s| s.rounded),
            display: display.to_string(),
            reason: evidence.source(),
        }
    }
}

/// Hits against one bound of one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampCounter {
    pub axis: Axis,
    pub bound: ClampBound,
    pub hits: usize,
    pub total: usize,
    pub rate: f64,
}

/// Running clamp tally for a batch
#[derive(Debug, Clone, Default)]
pub struct ClampTally {
    // [axis][min, max]
    hits: [[usize; 2]; 4],
    days: usize,
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Magnitude => 0,
        Axis::DirectionalBias => 1,
        Axis::Coherence => 2,
        Axis::Sfd => 3,
    }
}

impl ClampTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_day(&mut self) {
        self.days += 1;
    }

    pub fn record(&mut self, scaled: &ScaledAxis) {
        if let Some(bound) = scaled.clamp_hit {
            let b = match bound {
                ClampBound::Min => 0,
                ClampBound::Max => 1,
            };
            self.hits[axis_index(scaled.axis)][b] += 1;
        }
    }

    pub fn hits(&self, axis: Axis, bound: ClampBound) -> usize {
        let b = match bound {
            ClampBound::Min => 0,
            ClampBound::Max => 1,
        };
        self.hits[axis_index(axis)][b]
    }

    /// Fraction of days where the axis hit either bound
    pub fn rate(&self, axis: Axis) -> f64 {
        if self.days == 0 {
            return 0.0;
        }
        let [min, max] = self.hits[axis_index(axis)];
        (min + max) as f64 / self.days as f64
    }

    /// All eight counters, axis-major, min before max
    pub fn counters(&self) -> Vec<ClampCounter> {
        Axis::ALL
            .into_iter()
            .flat_map(|axis| {
                [ClampBound::Min, ClampBound::Max].into_iter().map(move |bound| {
                    let hits = self.hits(axis, bound);
                    ClampCounter {
                        axis,
                        bound,
                        hits,
                        total: self.days,
                        rate: if self.days == 0 {
                            0.0
                        } else {
                            hits as f64 / self.days as f64
                        },
                    }
                })
            })
            .collect()
    }

    pub fn alerts(&self, thresholds: &AlertThresholds) -> Vec<String> {
        if self.days == 0 {
            return Vec::new();
        }
        Axis::ALL
            .into_iter()
            .filter_map(|axis| {
                let limit = thresholds.for_axis(axis)?;
                let rate = self.rate(axis);
                (rate > limit).then(|| {
                    let alert = format!(
                        "{} clamp rate {:.0}% exceeded {:.0}% in absolute scaling mode.",
                        axis_label(axis),
                        rate * 100.0,
                        limit * 100.0
                    );
                    tracing::warn!(axis = axis.as_str(), rate, limit, "clamp rate alert");
                    alert
                })
            })
            .collect()
    }
}

fn axis_label(axis: Axis) -> &'static str {
    match axis {
        Axis::Magnitude => "Magnitude",
        Axis::DirectionalBias => "Directional bias",
        Axis::Coherence => "Coherence",
        Axis::Sfd => "SFD",
    }
}

/// Everything a batch render reports besides the days themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilitySnapshot {
    pub traces: Vec<AxisTrace>,
    pub sfd: Vec<SfdTrace>,
    pub clamp_summary: Vec<ClampCounter>,
    pub alerts: Vec<String>,
    pub warnings: Vec<ValidationIssue>,
}
