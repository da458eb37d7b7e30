//! Per-axis scaling transforms
//!
//! Every axis runs the same four steps: normalize → scale → clamp → round.
//! Each step's value is kept in a [`ScaledAxis`] so the renderer can emit an
//! audit trace next to the display value.

use crate::error::EngineError;
use crate::types::{AxisDisplay, AxisSource, CoherenceSource, SfdDisplay, SfdSource, SfdStatus};
use crate::weights::SfdSums;
use serde::{Deserialize, Serialize};

const MINUS_SIGN: char = '\u{2212}';

/// Multipliers from normalized engine values to display range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub magnitude: f64,
    pub directional_bias: f64,
    pub coherence: f64,
    pub sfd: f64,
}

pub const SCALE_FACTORS: ScaleFactors = ScaleFactors {
    magnitude: 50.0,
    directional_bias: 50.0,
    coherence: 50.0,
    sfd: 10.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Magnitude,
    DirectionalBias,
    Coherence,
    Sfd,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::Magnitude,
        Axis::DirectionalBias,
        Axis::Coherence,
        Axis::Sfd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Magnitude => "magnitude",
            Axis::DirectionalBias => "directional_bias",
            Axis::Coherence => "coherence",
            Axis::Sfd => "sfd",
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Axis::Magnitude | Axis::Coherence => (0.0, 5.0),
            Axis::DirectionalBias => (-5.0, 5.0),
            Axis::Sfd => (-1.0, 1.0),
        }
    }

    pub fn decimals(&self) -> i32 {
        match self {
            Axis::Sfd => 2,
            _ => 1,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Axis::Magnitude | Axis::Coherence => "0–5",
            Axis::DirectionalBias => "−5…+5",
            Axis::Sfd => "−1…+1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampBound {
    Min,
    Max,
}

/// One axis value at every pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledAxis {
    pub axis: Axis,
    pub normalized: f64,
    pub scaled: f64,
    pub clamped: f64,
    pub rounded: f64,
    pub clamp_hit: Option<ClampBound>,
}

/// Round half away from zero at `decimals` places; non-finite → 0
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    let rounded = (value.abs() * factor + f64::EPSILON).round() / factor;
    if value < 0.0 {
        -rounded
    } else {
        rounded
    }
}

/// Clamp, reporting which bound was hit. Non-finite input pins to `min`.
pub fn clamp_with_bound(value: f64, min: f64, max: f64) -> (f64, Option<ClampBound>) {
    if !value.is_finite() {
        return (min, Some(ClampBound::Min));
    }
    if value < min {
        (min, Some(ClampBound::Min))
    } else if value > max {
        (max, Some(ClampBound::Max))
    } else {
        (value, None)
    }
}

fn finish(axis: Axis, normalized: f64, scaled: f64) -> ScaledAxis {
    let (min, max) = axis.bounds();
    let (clamped, clamp_hit) = clamp_with_bound(scaled, min, max);
    let rounded = round_half_up(clamped, axis.decimals());
    ScaledAxis {
        axis,
        normalized,
        scaled,
        clamped,
        rounded,
        clamp_hit,
    }
}

/// ×50, clamp [0,5], 1dp
pub fn scale_magnitude(normalized: f64) -> ScaledAxis {
    finish(Axis::Magnitude, normalized, normalized * SCALE_FACTORS.magnitude)
}

/// ×50, clamp [−5,5], 1dp
pub fn scale_directional_bias(normalized: f64) -> ScaledAxis {
    finish(
        Axis::DirectionalBias,
        normalized,
        normalized * SCALE_FACTORS.directional_bias,
    )
}

/// Direct (×50) or inverted from volatility (5 − v×50); clamp [0,5], 1dp
pub fn scale_coherence(value: f64, source: CoherenceSource) -> ScaledAxis {
    let scaled = match source {
        CoherenceSource::Volatility => 5.0 - SCALE_FACTORS.coherence * value,
        CoherenceSource::Coherence => SCALE_FACTORS.coherence * value,
    };
    finish(Axis::Coherence, value, scaled)
}

/// Clamp [−1,1], 2dp. `raw` is already on the display scale.
pub fn scale_sfd(raw: f64) -> ScaledAxis {
    finish(Axis::Sfd, raw, raw)
}

pub fn coherence_transform_label(source: CoherenceSource) -> &'static str {
    match source {
        CoherenceSource::Volatility => "5 − (volatility × 50), clamp [0,5], round 1dp",
        CoherenceSource::Coherence => "×50, clamp [0,5], round 1dp",
    }
}

pub fn transform_label(axis: Axis) -> &'static str {
    match axis {
        Axis::Magnitude | Axis::Coherence => "×50, clamp [0,5], round 1dp",
        Axis::DirectionalBias => "×50, clamp [−5,5], round 1dp",
        Axis::Sfd => "clamp [−1,1], round 2dp",
    }
}

/// Fixed-point text with U+2212 for negatives and optional leading `+`
pub fn format_with_minus(value: f64, decimals: usize, show_plus: bool) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let nonzero = text.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if value < 0.0 && nonzero {
        format!("{MINUS_SIGN}{text}")
    } else if value > 0.0 && nonzero && show_plus {
        format!("+{text}")
    } else {
        text
    }
}

pub fn magnitude_label(value: f64) -> &'static str {
    if !value.is_finite() {
        "n/a"
    } else if value >= 4.0 {
        "Peak"
    } else if value >= 2.0 {
        "Active"
    } else if value >= 1.0 {
        "Murmur"
    } else {
        "Latent"
    }
}

/// Non-finite reads as equilibrium
pub fn directional_bias_label(value: f64) -> &'static str {
    if !value.is_finite() {
        "Equilibrium"
    } else if value >= 3.0 {
        "Strong Outward"
    } else if value >= 1.0 {
        "Mild Outward"
    } else if value >= -1.0 {
        "Equilibrium"
    } else if value >= -3.0 {
        "Mild Inward"
    } else {
        "Strong Inward"
    }
}

pub fn coherence_label(value: f64) -> &'static str {
    if !value.is_finite() {
        "n/a"
    } else if value >= 4.0 {
        "Very Stable"
    } else if value >= 2.0 {
        "Stable"
    } else if value >= 1.0 {
        "Moderate"
    } else {
        "Scattered"
    }
}

pub fn sfd_label(value: Option<f64>) -> &'static str {
    match value.filter(|v| v.is_finite()) {
        None => "n/a",
        Some(v) if v >= 0.5 => "Strong Cooperation",
        Some(v) if v >= 0.1 => "Mild Cooperation",
        Some(v) if v >= -0.1 => "Balanced",
        Some(v) if v >= -0.5 => "Mild Fragmentation",
        Some(_) => "Strong Fragmentation",
    }
}

/// Qualitative band for a display-scale value on `axis`
pub fn band_label(axis: Axis, value: f64) -> &'static str {
    match axis {
        Axis::Magnitude => magnitude_label(value),
        Axis::DirectionalBias => directional_bias_label(value),
        Axis::Coherence => coherence_label(value),
        Axis::Sfd => sfd_label(Some(value)),
    }
}

/// Build the display record for a numeric axis
pub fn axis_display(scaled: &ScaledAxis, source: AxisSource) -> AxisDisplay {
    let show_plus = scaled.axis == Axis::DirectionalBias;
    AxisDisplay {
        value: scaled.rounded,
        display: format_with_minus(scaled.rounded, scaled.axis.decimals() as usize, show_plus),
        unit: scaled.axis.unit().to_string(),
        label: band_label(scaled.axis, scaled.rounded).to_string(),
        source,
        clamp_hit: scaled.clamp_hit.is_some(),
    }
}

/// What an SFD value rests on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SfdEvidence {
    /// The engine supplied a value
    Engine { value: f64 },
    /// Weighted aspects
    Aspects { sums: SfdSums },
    None,
}

impl SfdEvidence {
    pub fn source(&self) -> SfdSource {
        match self {
            SfdEvidence::Engine { .. } => SfdSource::Engine,
            SfdEvidence::Aspects { .. } => SfdSource::Computed,
            SfdEvidence::None => SfdSource::Absent,
        }
    }

    fn supports_a_value(&self) -> bool {
        match self {
            SfdEvidence::Engine { value } => value.is_finite(),
            SfdEvidence::Aspects { sums } => sums.has_signal(),
            SfdEvidence::None => false,
        }
    }

    fn sums(&self) -> Option<SfdSums> {
        match self {
            SfdEvidence::Aspects { sums } => Some(*sums),
            _ => None,
        }
    }
}

/// Choose the SFD for one day.
///
/// An engine value wins; it is multiplied by the SFD scale factor unless
/// `pre_scaled` is set. Otherwise the aspect sums are used. With neither, the
/// result is `None` and the day shows "n/a".
pub fn resolve_sfd(
    engine_value: Option<f64>,
    pre_scaled: bool,
    sums: SfdSums,
) -> (Option<ScaledAxis>, SfdEvidence) {
    if let Some(value) = engine_value.filter(|v| v.is_finite()) {
        let raw = if pre_scaled {
            value
        } else {
            value * SCALE_FACTORS.sfd
        };
        return (Some(scale_sfd(raw)), SfdEvidence::Engine { value });
    }

    match sums.differential() {
        Some(raw) => (Some(scale_sfd(raw)), SfdEvidence::Aspects { sums }),
        None => (None, SfdEvidence::None),
    }
}

/// Render an SFD value, refusing any number without supporting evidence
pub fn display_sfd(
    date: &str,
    scaled: Option<&ScaledAxis>,
    evidence: &SfdEvidence,
) -> Result<SfdDisplay, EngineError> {
    let sums = evidence.sums();
    let Some(scaled) = scaled else {
        let mut display = SfdDisplay::not_applicable(evidence.source());
        display.supportive = sums.map(|s| s.supportive);
        display.frictional = sums.map(|s| s.frictional);
        return Ok(display);
    };

    if !evidence.supports_a_value() {
        return Err(EngineError::Fabrication {
            date: date.to_string(),
            reason: "SFD value has no engine input and no weighted aspects".to_string(),
        });
    }

    Ok(SfdDisplay {
        value: Some(scaled.rounded),
        display: format_with_minus(scaled.rounded, 2, true),
        status: SfdStatus::Ok,
        label: sfd_label(Some(scaled.rounded)).to_string(),
        source: evidence.source(),
        supportive: sums.map(|s| s.supportive),
        frictional: sums.map(|s| s.frictional),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(1.25, 1), 1.3);
        assert_eq!(round_half_up(-1.25, 1), -1.3);
        assert_eq!(round_half_up(0.125, 2), 0.13);
        assert_eq!(round_half_up(2.0, 1), 2.0);
        assert_eq!(round_half_up(f64::NAN, 1), 0.0);
    }

    #[test]
    fn test_magnitude_transform() {
        let m = scale_magnitude(0.05);
        assert!((m.scaled - 2.5).abs() < 1e-12);
        assert_eq!(m.rounded, 2.5);
        assert_eq!(m.clamp_hit, None);

        let hi = scale_magnitude(0.2);
        assert_eq!(hi.clamped, 5.0);
        assert_eq!(hi.clamp_hit, Some(ClampBound::Max));

        let lo = scale_magnitude(-0.01);
        assert_eq!(lo.rounded, 0.0);
        assert_eq!(lo.clamp_hit, Some(ClampBound::Min));
    }

    #[test]
    fn test_directional_bias_transform() {
        let b = scale_directional_bias(-0.044);
        assert_eq!(b.rounded, -2.2);
        assert_eq!(scale_directional_bias(-0.5).clamp_hit, Some(ClampBound::Min));
        assert_eq!(scale_directional_bias(0.5).rounded, 5.0);
    }

    #[test]
    fn test_coherence_modes() {
        let inverted = scale_coherence(0.02, CoherenceSource::Volatility);
        assert_eq!(inverted.rounded, 4.0);
        let direct = scale_coherence(0.02, CoherenceSource::Coherence);
        assert_eq!(direct.rounded, 1.0);
        let calm = scale_coherence(0.0, CoherenceSource::Volatility);
        assert_eq!(calm.rounded, 5.0);
        assert_eq!(calm.clamp_hit, None);
        let wild = scale_coherence(0.3, CoherenceSource::Volatility);
        assert_eq!(wild.clamp_hit, Some(ClampBound::Min));
    }

    #[test]
    fn test_outputs_always_in_bounds() {
        let inputs = [-10.0, -1.0, -0.1, -0.0001, 0.0, 0.0333, 0.1, 1.0, 10.0, f64::NAN];
        for x in inputs {
            let m = scale_magnitude(x).rounded;
            assert!((0.0..=5.0).contains(&m));
            let b = scale_directional_bias(x).rounded;
            assert!((-5.0..=5.0).contains(&b));
            for source in [CoherenceSource::Volatility, CoherenceSource::Coherence] {
                let c = scale_coherence(x, source).rounded;
                assert!((0.0..=5.0).contains(&c));
            }
            let s = scale_sfd(x).rounded;
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_monotonic_per_axis() {
        let mut prev = (f64::MIN, f64::MIN, f64::MIN, f64::MAX, f64::MIN);
        let mut x = -0.2;
        while x <= 0.2 {
            let m = scale_magnitude(x).rounded;
            let b = scale_directional_bias(x).rounded;
            let c = scale_coherence(x, CoherenceSource::Coherence).rounded;
            let v = scale_coherence(x, CoherenceSource::Volatility).rounded;
            let s = scale_sfd(x * 10.0).rounded;
            assert!(m >= prev.0 && b >= prev.1 && c >= prev.2 && s >= prev.4, "x = {x}");
            // inverted coherence falls as volatility rises
            assert!(v <= prev.3, "x = {x}");
            prev = (m, b, c, v, s);
            x += 0.0007;
        }
    }

    #[test]
    fn test_idempotent_on_rounded_output() {
        for tenths in -50..=50 {
            let v = tenths as f64 / 10.0;
            let bias = scale_directional_bias(v / 50.0);
            assert_eq!(bias.rounded, v);
            assert_eq!(round_half_up(bias.rounded, 1), bias.rounded);
        }
        for hundredths in -100..=100 {
            let v = hundredths as f64 / 100.0;
            let sfd = scale_sfd(v);
            assert_eq!(sfd.rounded, v);
            assert_eq!(scale_sfd(sfd.rounded).rounded, sfd.rounded);
        }
    }

    #[test]
    fn test_format_with_minus() {
        assert_eq!(format_with_minus(-2.2, 1, true), "\u{2212}2.2");
        assert_eq!(format_with_minus(2.2, 1, true), "+2.2");
        assert_eq!(format_with_minus(2.2, 1, false), "2.2");
        assert_eq!(format_with_minus(0.0, 2, true), "0.00");
        assert_eq!(format_with_minus(-0.0, 1, true), "0.0");
        assert_eq!(format_with_minus(-0.001, 1, true), "0.0");
    }

    #[test]
    fn test_axis_display_bias_shows_plus() {
        let display = axis_display(&scale_directional_bias(0.06), AxisSource::Engine);
        assert_eq!(display.display, "+3.0");
        assert_eq!(display.unit, "−5…+5");
        let display = axis_display(&scale_magnitude(0.06), AxisSource::Engine);
        assert_eq!(display.display, "3.0");
    }

    #[test]
    fn test_magnitude_band_edges() {
        assert_eq!(magnitude_label(0.99), "Latent");
        assert_eq!(magnitude_label(1.0), "Murmur");
        assert_eq!(magnitude_label(1.99), "Murmur");
        assert_eq!(magnitude_label(2.0), "Active");
        assert_eq!(magnitude_label(3.99), "Active");
        assert_eq!(magnitude_label(4.0), "Peak");
        assert_eq!(magnitude_label(f64::NAN), "n/a");
    }

    #[test]
    fn test_directional_bias_band_edges() {
        assert_eq!(directional_bias_label(3.0), "Strong Outward");
        assert_eq!(directional_bias_label(2.99), "Mild Outward");
        assert_eq!(directional_bias_label(1.0), "Mild Outward");
        assert_eq!(directional_bias_label(0.99), "Equilibrium");
        assert_eq!(directional_bias_label(-1.0), "Equilibrium");
        assert_eq!(directional_bias_label(-1.01), "Mild Inward");
        assert_eq!(directional_bias_label(-3.0), "Mild Inward");
        assert_eq!(directional_bias_label(-3.01), "Strong Inward");
        assert_eq!(directional_bias_label(f64::NAN), "Equilibrium");
    }

    #[test]
    fn test_coherence_band_edges() {
        assert_eq!(coherence_label(0.99), "Scattered");
        assert_eq!(coherence_label(1.0), "Moderate");
        assert_eq!(coherence_label(1.99), "Moderate");
        assert_eq!(coherence_label(2.0), "Stable");
        assert_eq!(coherence_label(3.99), "Stable");
        assert_eq!(coherence_label(4.0), "Very Stable");
        assert_eq!(coherence_label(f64::INFINITY), "n/a");
    }

    #[test]
    fn test_sfd_band_edges() {
        assert_eq!(sfd_label(Some(0.5)), "Strong Cooperation");
        assert_eq!(sfd_label(Some(0.49)), "Mild Cooperation");
        assert_eq!(sfd_label(Some(0.1)), "Mild Cooperation");
        assert_eq!(sfd_label(Some(0.09)), "Balanced");
        assert_eq!(sfd_label(Some(-0.1)), "Balanced");
        assert_eq!(sfd_label(Some(-0.11)), "Mild Fragmentation");
        assert_eq!(sfd_label(Some(-0.5)), "Mild Fragmentation");
        assert_eq!(sfd_label(Some(-0.51)), "Strong Fragmentation");
        assert_eq!(sfd_label(None), "n/a");
        assert_eq!(sfd_label(Some(f64::NAN)), "n/a");
    }

    #[test]
    fn test_display_records_carry_labels() {
        let display = axis_display(&scale_magnitude(0.09), AxisSource::Engine);
        assert_eq!(display.label, "Peak");
        let display = axis_display(&scale_directional_bias(-0.044), AxisSource::Engine);
        assert_eq!(display.label, "Mild Inward");
        let display = axis_display(
            &scale_coherence(0.012, CoherenceSource::Volatility),
            AxisSource::Computed,
        );
        assert_eq!(display.label, "Very Stable");

        let (scaled, evidence) = resolve_sfd(None, false, SfdSums::default());
        let display = display_sfd("d", scaled.as_ref(), &evidence).unwrap();
        assert_eq!(display.label, "n/a");
        let (scaled, evidence) = resolve_sfd(Some(0.03), false, SfdSums::default());
        let display = display_sfd("d", scaled.as_ref(), &evidence).unwrap();
        assert_eq!(display.label, "Mild Cooperation");
    }

    #[test]
    fn test_resolve_sfd_engine_scaling() {
        let (scaled, evidence) = resolve_sfd(Some(0.05), false, SfdSums::default());
        assert_eq!(scaled.unwrap().rounded, 0.5);
        assert_eq!(evidence.source(), SfdSource::Engine);

        let (scaled, _) = resolve_sfd(Some(0.35), true, SfdSums::default());
        assert_eq!(scaled.unwrap().rounded, 0.35);

        // the flag alone decides: a large unflagged value is still ×10 and clamps
        let (scaled, _) = resolve_sfd(Some(0.35), false, SfdSums::default());
        let scaled = scaled.unwrap();
        assert_eq!(scaled.rounded, 1.0);
        assert_eq!(scaled.clamp_hit, Some(ClampBound::Max));
    }

    #[test]
    fn test_resolve_sfd_from_aspects_and_absent() {
        let sums = SfdSums {
            supportive: 0.6,
            frictional: 0.6,
        };
        let (scaled, evidence) = resolve_sfd(None, false, sums);
        let display = display_sfd("2025-01-01", scaled.as_ref(), &evidence).unwrap();
        assert_eq!(display.display, "0.00");
        assert_eq!(display.status, SfdStatus::Ok);
        assert_eq!(display.source, SfdSource::Computed);

        let (scaled, evidence) = resolve_sfd(None, false, SfdSums::default());
        assert!(scaled.is_none());
        let display = display_sfd("2025-01-01", scaled.as_ref(), &evidence).unwrap();
        assert_eq!(display.display, "n/a");
        assert_eq!(display.status, SfdStatus::NotApplicable);
        assert_eq!(display.source, SfdSource::Absent);
    }

    #[test]
    fn test_display_sfd_signs() {
        let sums = SfdSums {
            supportive: 0.3,
            frictional: 0.9,
        };
        let (scaled, evidence) = resolve_sfd(None, false, sums);
        let display = display_sfd("d", scaled.as_ref(), &evidence).unwrap();
        assert_eq!(display.display, "\u{2212}0.50");
        assert_eq!(display.value, Some(-0.5));
    }

    #[test]
    fn test_fabrication_sentinel() {
        let orphan = scale_sfd(0.4);
        let err = display_sfd("2025-01-02", Some(&orphan), &SfdEvidence::None).unwrap_err();
        assert!(matches!(err, EngineError::Fabrication { ref date, .. } if date == "2025-01-02"));

        let empty = SfdEvidence::Aspects {
            sums: SfdSums::default(),
        };
        assert!(display_sfd("2025-01-02", Some(&orphan), &empty).is_err());
    }
}
