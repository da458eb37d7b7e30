//! Astro Weather - chart geometry and symbolic-weather scoring engine
//!
//! The engine has two halves that share one error type and one data model:
//!
//! - **Geometry**: civil birth time → UTC instant → sidereal time → angles →
//!   house cusps (Placidus or Whole Sign), with relocation and house lookup.
//! - **Symbolic weather**: aspect lists gated by an orb profile, weighted into a
//!   Support/Friction Differential, and rendered with the other daily axes
//!   through normalize → scale → clamp → round, with clamp observability and
//!   a provenance hash over the normalized inputs.
//!
//! Every operation is deterministic for a given input, apart from the
//! provenance run id and export timestamp when the caller leaves them unset.

pub mod angles;
pub mod aspects;
pub mod bodies;
pub mod chart;
pub mod error;
pub mod houses;
pub mod observability;
pub mod orbs;
pub mod pipeline;
pub mod provenance;
pub mod scaling;
pub mod time;
pub mod types;
pub mod validation;
pub mod weights;

pub use aspects::{Aspect, AspectType, BodyLongitude};
pub use chart::{compute_chart, compute_geometry, relocate, ChartReport, ChartRequest, GeometrySnapshot, Relocation};
pub use error::EngineError;
pub use houses::{house_for_longitude, HouseCusps, HouseSystem};
pub use orbs::{available_profiles, filter_by_orb_profile, OrbProfile, ProfileId};
pub use pipeline::{render_symbolic_weather, RenderResult, RendererConfig, WeatherRenderer};
pub use types::{BirthMoment, CivilDateTime, DayMetricsInput, DayMetricsOutput, GeoCoordinate};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier recorded in provenance when the caller supplies none
pub const ENGINE_BUILD: &str = concat!("astro-weather@", env!("CARGO_PKG_VERSION"));
