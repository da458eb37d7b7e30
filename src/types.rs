//! Core types shared across the engine
//!
//! Inputs (birth moments, relocation coordinates, per-day normalized metrics)
//! and the per-day display records the renderer produces.

use crate::aspects::Aspect;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Civil wall-clock date and time, not yet tied to a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    #[serde(default)]
    pub second: u32,
}

impl CivilDateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }
}

impl fmt::Display for CivilDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Geographic position in decimal degrees (east and north positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(EngineError::InvalidCoordinate {
                field: "latitude",
                value: self.latitude,
            });
        }
        if !self.longitude.is_finite() || self.longitude.abs() > 180.0 {
            return Err(EngineError::InvalidCoordinate {
                field: "longitude",
                value: self.longitude,
            });
        }
        Ok(())
    }

    /// Same point with longitude wrapped into [-180, 180]
    pub fn with_normalized_longitude(&self) -> Self {
        let mut lon = self.longitude.rem_euclid(360.0);
        if lon > 180.0 {
            lon -= 360.0;
        }
        Self {
            latitude: self.latitude,
            longitude: lon,
        }
    }
}

/// A birth (or event) moment: civil time, IANA zone and place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthMoment {
    pub date: CivilDateTime,
    pub timezone: String,
    pub location: GeoCoordinate,
}

/// Where the coherence axis is read from for a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoherenceSource {
    /// Inverted from volatility: `5 − volatility × 50`
    #[default]
    Volatility,
    /// Read directly: `coherence × 50`
    Coherence,
}

impl CoherenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoherenceSource::Volatility => "volatility",
            CoherenceSource::Coherence => "coherence",
        }
    }
}

/// One day of normalized engine output, before scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMetricsInput {
    /// ISO date or datetime
    pub date: String,
    /// Normalized magnitude, nominally [0, 1]
    pub magnitude: f64,
    /// Normalized directional bias, nominally [-1, 1]
    pub directional_bias: f64,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub coherence: Option<f64>,
    /// Engine-supplied SFD, if any
    #[serde(default)]
    pub sfd: Option<f64>,
    #[serde(default)]
    pub sfd_pre_scaled: bool,
    #[serde(default)]
    pub aspects: Vec<Aspect>,
    /// Overrides the batch timezone for this day
    #[serde(default)]
    pub timezone: Option<String>,
}

impl DayMetricsInput {
    pub fn new(date: impl Into<String>, magnitude: f64, directional_bias: f64) -> Self {
        Self {
            date: date.into(),
            magnitude,
            directional_bias,
            volatility: None,
            coherence: None,
            sfd: None,
            sfd_pre_scaled: false,
            aspects: Vec::new(),
            timezone: None,
        }
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    pub fn with_coherence(mut self, coherence: f64) -> Self {
        self.coherence = Some(coherence);
        self
    }

    pub fn with_sfd(mut self, sfd: f64, pre_scaled: bool) -> Self {
        self.sfd = Some(sfd);
        self.sfd_pre_scaled = pre_scaled;
        self
    }

    pub fn with_aspects(mut self, aspects: Vec<Aspect>) -> Self {
        self.aspects = aspects;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

/// Whether an axis value came straight from the engine or was derived here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSource {
    Engine,
    Computed,
}

/// A rendered, bounded axis value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDisplay {
    pub value: f64,
    pub display: String,
    pub unit: String,
    /// Qualitative band of the rounded value
    pub label: String,
    pub source: AxisSource,
    pub clamp_hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SfdStatus {
    Ok,
    #[serde(rename = "n/a")]
    NotApplicable,
    /// The fabrication sentinel rejected the value
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SfdSource {
    Engine,
    Computed,
    Absent,
}

/// The rendered Support/Friction Differential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfdDisplay {
    pub value: Option<f64>,
    pub display: String,
    pub status: SfdStatus,
    pub label: String,
    pub source: SfdSource,
    pub supportive: Option<f64>,
    pub frictional: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SfdDisplay {
    pub fn not_applicable(source: SfdSource) -> Self {
        Self {
            value: None,
            display: "n/a".to_string(),
            status: SfdStatus::NotApplicable,
            label: "n/a".to_string(),
            source,
            supportive: None,
            frictional: None,
            error: None,
        }
    }

    pub fn failed(source: SfdSource, error: &EngineError) -> Self {
        Self {
            value: None,
            display: "n/a".to_string(),
            status: SfdStatus::Failed,
            label: "n/a".to_string(),
            source,
            supportive: None,
            frictional: None,
            error: Some(error.to_string()),
        }
    }
}

/// The four rendered axes of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAxes {
    pub magnitude: AxisDisplay,
    pub directional_bias: AxisDisplay,
    pub narrative_coherence: AxisDisplay,
    pub integration_bias: SfdDisplay,
}

/// One rendered day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMetricsOutput {
    /// Canonical ISO date in the day's timezone
    pub date: String,
    pub timezone: String,
    pub axes: DayAxes,
}
