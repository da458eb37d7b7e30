//! Pipeline orchestration
//!
//! Renders a batch of per-day normalized metrics into bounded display values.
//!
//! Pipeline stages, per day:
//! 1. Validation - named rules; errors stop the batch, warnings are reported
//! 2. Orb gating - optional orb-profile filter over the day's aspects
//! 3. Weighting - supportive/frictional sums for the SFD
//! 4. Scaling - normalize → scale → clamp → round for each axis
//! 5. Provenance - canonical record for the input hash
//!
//! Output order always matches input order and no day is dropped.

use crate::error::EngineError;
use crate::observability::{AlertThresholds, AxisTrace, ClampTally, ObservabilitySnapshot, SfdTrace};
use crate::orbs::{orb_profile, OrbProfile, ProfileId};
use crate::provenance::{canonicalize_date, hash_normalized_input, HashRecord, Provenance, ProvenanceConfig};
use crate::scaling::{
    axis_display, coherence_transform_label, display_sfd, resolve_sfd, scale_coherence,
    scale_directional_bias, scale_magnitude, transform_label, Axis, ScaleFactors, ScaledAxis,
    SfdEvidence, SCALE_FACTORS,
};
use crate::time::parse_timezone;
use crate::types::{
    AxisSource, CoherenceSource, DayAxes, DayMetricsInput, DayMetricsOutput, SfdDisplay, SfdStatus,
};
use crate::validation::{validate_batch, ValidationReport};
use crate::weights::weigh_aspects;
use serde::{Deserialize, Serialize};

pub const SPEC_VERSION: &str = "3.1";
pub const SCALING_MODE: &str = "absolute";
pub const PIPELINE_LABEL: &str = "normalize → scale → clamp → round";
pub const WEIGHTS_PROFILE_VERSION: &str = "tight_orbs_v1";
pub const CONJUNCTION_POLICY: &str = "neutral";
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub coherence_from: CoherenceSource,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Orb profile id used to gate aspects before weighting; none = no gating
    #[serde(default)]
    pub orb_profile: Option<String>,
    #[serde(default)]
    pub provenance: ProvenanceConfig,
    #[serde(default)]
    pub alert_thresholds: AlertThresholds,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            coherence_from: CoherenceSource::default(),
            timezone: default_timezone(),
            orb_profile: None,
            provenance: ProvenanceConfig::default(),
            alert_thresholds: AlertThresholds::default(),
        }
    }
}

impl RendererConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Metadata describing how a batch was rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererMetadata {
    pub spec_version: String,
    pub scaling_mode: String,
    pub scale_factors: ScaleFactors,
    pub coherence_from: CoherenceSource,
    pub coherence_inversion: bool,
    pub pipeline: String,
    pub weights_profile_version: String,
    pub conjunction_policy: String,
    pub sfd_pre_scaled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_profile: Option<ProfileId>,
    pub normalized_input_hash: String,
    pub timezone: String,
    pub provenance: Provenance,
}

/// A rendered batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub days: Vec<DayMetricsOutput>,
    pub metadata: RendererMetadata,
    pub observability: ObservabilitySnapshot,
}

/// Render a batch with the given configuration
pub fn render_symbolic_weather(
    inputs: &[DayMetricsInput],
    config: &RendererConfig,
) -> Result<RenderResult, EngineError> {
    WeatherRenderer::with_config(config.clone()).render(inputs)
}

/// Render a JSON array of days; returns the JSON-encoded result
pub fn render_symbolic_weather_json(
    days_json: &str,
    config: &RendererConfig,
) -> Result<String, EngineError> {
    let inputs: Vec<DayMetricsInput> = serde_json::from_str(days_json)?;
    let result = render_symbolic_weather(&inputs, config)?;
    Ok(serde_json::to_string(&result)?)
}

/// Batch renderer holding a fixed configuration
pub struct WeatherRenderer {
    config: RendererConfig,
    profile: Option<Box<dyn OrbProfile>>,
}

impl Default for WeatherRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherRenderer {
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        let profile = config
            .orb_profile
            .as_deref()
            .map(|id| orb_profile(ProfileId::resolve(id)));
        Self { config, profile }
    }

    pub fn render(&self, inputs: &[DayMetricsInput]) -> Result<RenderResult, EngineError> {
        parse_timezone(&self.config.timezone)?;
        let coherence_from = self.config.coherence_from;

        let report = validate_batch(inputs, coherence_from);
        reject_errors(&report)?;
        for warning in report.warnings() {
            tracing::warn!(rule = ?warning.rule, date = %warning.date, "{}", warning.message);
        }

        let mut tally = ClampTally::new();
        let mut traces = Vec::with_capacity(inputs.len() * 3);
        let mut sfd_traces = Vec::with_capacity(inputs.len());
        let mut records = Vec::with_capacity(inputs.len());
        let mut days = Vec::with_capacity(inputs.len());

        for input in inputs {
            let timezone = input
                .timezone
                .clone()
                .unwrap_or_else(|| self.config.timezone.clone());
            let date = canonicalize_date(&input.date, &timezone)?;
            tally.record_day();

            let magnitude = scale_magnitude(input.magnitude);
            let bias = scale_directional_bias(input.directional_bias);
            let coherence_value = match coherence_from {
                CoherenceSource::Volatility => input.volatility,
                CoherenceSource::Coherence => input.coherence,
            }
            .unwrap_or(0.0);
            let coherence = scale_coherence(coherence_value, coherence_from);

            for scaled in [&magnitude, &bias, &coherence] {
                tally.record(scaled);
            }
            traces.push(AxisTrace::new(&date, &magnitude, transform_label(Axis::Magnitude)));
            traces.push(AxisTrace::new(&date, &bias, transform_label(Axis::DirectionalBias)));
            traces.push(AxisTrace::new(
                &date,
                &coherence,
                coherence_transform_label(coherence_from),
            ));

            let gated;
            let weighted_aspects = match &self.profile {
                Some(profile) => {
                    gated = profile.filter(&input.aspects);
                    &gated
                }
                None => &input.aspects,
            };
            let sums = weigh_aspects(weighted_aspects);
            let (sfd_scaled, evidence) = resolve_sfd(input.sfd, input.sfd_pre_scaled, sums);
            let sfd = render_sfd(&date, sfd_scaled.as_ref(), &evidence);
            if sfd.status == SfdStatus::Ok {
                if let Some(scaled) = &sfd_scaled {
                    tally.record(scaled);
                }
            }
            sfd_traces.push(SfdTrace::new(&date, sfd_scaled.as_ref(), &evidence, &sfd.display));

            tracing::debug!(
                date = %date,
                magnitude = magnitude.rounded,
                directional_bias = bias.rounded,
                coherence = coherence.rounded,
                sfd = %sfd.display,
                "day rendered"
            );

            records.push(HashRecord::from_day(input, &date, &timezone, weighted_aspects));
            days.push(DayMetricsOutput {
                date,
                timezone,
                axes: DayAxes {
                    magnitude: axis_display(&magnitude, AxisSource::Engine),
                    directional_bias: axis_display(&bias, AxisSource::Engine),
                    narrative_coherence: axis_display(
                        &coherence,
                        match coherence_from {
                            CoherenceSource::Volatility => AxisSource::Computed,
                            CoherenceSource::Coherence => AxisSource::Engine,
                        },
                    ),
                    integration_bias: sfd,
                },
            });
        }

        let observability = ObservabilitySnapshot {
            traces,
            sfd: sfd_traces,
            clamp_summary: if inputs.is_empty() {
                Vec::new()
            } else {
                tally.counters()
            },
            alerts: tally.alerts(&self.config.alert_thresholds),
            warnings: report.warnings().cloned().collect(),
        };

        let metadata = RendererMetadata {
            spec_version: SPEC_VERSION.to_string(),
            scaling_mode: SCALING_MODE.to_string(),
            scale_factors: SCALE_FACTORS,
            coherence_from,
            coherence_inversion: coherence_from == CoherenceSource::Volatility,
            pipeline: PIPELINE_LABEL.to_string(),
            weights_profile_version: WEIGHTS_PROFILE_VERSION.to_string(),
            conjunction_policy: CONJUNCTION_POLICY.to_string(),
            sfd_pre_scaled: inputs.iter().any(|d| d.sfd_pre_scaled),
            orb_profile: self.profile.as_ref().map(|p| p.id()),
            normalized_input_hash: hash_normalized_input(&records)?,
            timezone: self.config.timezone.clone(),
            provenance: self.config.provenance.resolve(),
        };

        Ok(RenderResult {
            days,
            metadata,
            observability,
        })
    }
}

/// SFD display for one day; a sentinel rejection withholds the axis only
fn render_sfd(date: &str, scaled: Option<&ScaledAxis>, evidence: &SfdEvidence) -> SfdDisplay {
    match display_sfd(date, scaled, evidence) {
        Ok(display) => display,
        Err(err) => {
            tracing::error!(date = %date, error = %err, "SFD axis withheld");
            SfdDisplay::failed(evidence.source(), &err)
        }
    }
}

fn reject_errors(report: &ValidationReport) -> Result<(), EngineError> {
    let errors: Vec<String> = report.errors().map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(errors.join("; ")))
    }
}
