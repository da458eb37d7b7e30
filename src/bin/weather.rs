//! Weather CLI - command-line interface for the astro-weather engine
//!
//! Commands:
//! - geometry: Angles and house cusps for a birth moment
//! - relocate: Full chart report from a chart request (natal or relocated)
//! - house: House containing a longitude, given twelve cusps
//! - orb: Effective orb for an aspect between two bodies
//! - profiles: List available orb profiles
//! - render: Render a batch of daily metrics into symbolic weather

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use astro_weather::aspects::{Aspect, AspectType};
use astro_weather::chart::{compute_chart, compute_geometry, ChartRequest};
use astro_weather::houses::{house_for_longitude, HouseSystem};
use astro_weather::orbs::{available_profiles, orb_profile, ProfileId};
use astro_weather::pipeline::{render_symbolic_weather, RendererConfig};
use astro_weather::types::{BirthMoment, CivilDateTime, CoherenceSource, DayMetricsInput, GeoCoordinate};
use astro_weather::{EngineError, ENGINE_VERSION};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Weather - chart geometry and symbolic-weather scoring
#[derive(Parser)]
#[command(name = "weather")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Chart geometry and symbolic-weather scoring engine", long_about = None)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Angles and house cusps for a birth moment
    Geometry {
        /// Civil date and time, e.g. 2000-01-01T12:00
        #[arg(long)]
        date: String,

        /// IANA timezone of the civil time
        #[arg(long)]
        timezone: String,

        /// Latitude in degrees, north positive
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees, east positive
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, value_enum, default_value = "placidus")]
        house_system: HouseSystemArg,
    },

    /// Chart report (placements, aspects, disclosure) from a chart request
    Relocate {
        /// Chart request JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// House containing a longitude
    House {
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Twelve comma-separated cusp longitudes, house 1 first
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        cusps: Vec<f64>,
    },

    /// Effective orb for an aspect between two bodies
    Orb {
        /// Aspect name, e.g. square or semi-square
        #[arg(long)]
        aspect: String,

        #[arg(long)]
        body_a: String,

        #[arg(long)]
        body_b: String,

        /// Orb profile id
        #[arg(long, default_value = "wm-spec-2025-09")]
        profile: String,

        /// Actual orb to test against the effective orb
        #[arg(long, allow_hyphen_values = true)]
        orb: Option<f64>,
    },

    /// List available orb profiles
    Profiles,

    /// Render daily metrics into symbolic weather
    Render {
        /// JSON array of days (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Renderer config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Batch timezone (IANA), overrides the config file
        #[arg(long)]
        timezone: Option<String>,

        /// Coherence axis source, overrides the config file
        #[arg(long, value_enum)]
        coherence_from: Option<CoherenceArg>,

        /// Gate aspects through this orb profile before weighting
        #[arg(long)]
        orb_profile: Option<String>,

        /// Dataset id recorded in provenance
        #[arg(long)]
        dataset_id: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HouseSystemArg {
    Placidus,
    WholeSign,
}

impl From<HouseSystemArg> for HouseSystem {
    fn from(arg: HouseSystemArg) -> Self {
        match arg {
            HouseSystemArg::Placidus => HouseSystem::Placidus,
            HouseSystemArg::WholeSign => HouseSystem::WholeSign,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CoherenceArg {
    Volatility,
    Coherence,
}

impl From<CoherenceArg> for CoherenceSource {
    fn from(arg: CoherenceArg) -> Self {
        match arg {
            CoherenceArg::Volatility => CoherenceSource::Volatility,
            CoherenceArg::Coherence => CoherenceSource::Coherence,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WeatherCliError> {
    let pretty = cli.pretty;
    match cli.command {
        Commands::Geometry {
            date,
            timezone,
            lat,
            lon,
            house_system,
        } => cmd_geometry(&date, &timezone, lat, lon, house_system.into(), pretty),

        Commands::Relocate { input } => cmd_relocate(&input, pretty),

        Commands::House { longitude, cusps } => cmd_house(longitude, &cusps, pretty),

        Commands::Orb {
            aspect,
            body_a,
            body_b,
            profile,
            orb,
        } => cmd_orb(&aspect, &body_a, &body_b, &profile, orb, pretty),

        Commands::Profiles => emit(&available_profiles(), pretty),

        Commands::Render {
            input,
            config,
            timezone,
            coherence_from,
            orb_profile,
            dataset_id,
        } => {
            let mut renderer_config = match config {
                Some(path) => RendererConfig::from_json(&fs::read_to_string(path)?)?,
                None => RendererConfig::default(),
            };
            if let Some(tz) = timezone {
                renderer_config.timezone = tz;
            }
            if let Some(source) = coherence_from {
                renderer_config.coherence_from = source.into();
            }
            if orb_profile.is_some() {
                renderer_config.orb_profile = orb_profile;
            }
            if dataset_id.is_some() {
                renderer_config.provenance.dataset_id = dataset_id;
            }
            cmd_render(&input, &renderer_config, pretty)
        }
    }
}

fn cmd_geometry(
    date: &str,
    timezone: &str,
    lat: f64,
    lon: f64,
    system: HouseSystem,
    pretty: bool,
) -> Result<(), WeatherCliError> {
    let birth = BirthMoment {
        date: parse_civil(date)?,
        timezone: timezone.to_string(),
        location: GeoCoordinate::new(lat, lon),
    };
    let snapshot = compute_geometry(&birth, system)?;
    emit(&snapshot, pretty)
}

fn cmd_relocate(input: &Path, pretty: bool) -> Result<(), WeatherCliError> {
    let request = ChartRequest::from_json(&read_input(input)?)?;
    let report = compute_chart(&request)?;
    emit(&report, pretty)
}

#[derive(Serialize)]
struct HouseOutput {
    longitude: f64,
    house: u8,
}

fn cmd_house(longitude: f64, cusps: &[f64], pretty: bool) -> Result<(), WeatherCliError> {
    let cusps: [f64; 12] = cusps.try_into().map_err(|_| {
        WeatherCliError::BadArgument(format!("expected 12 cusps, got {}", cusps.len()))
    })?;
    let house = house_for_longitude(longitude, &cusps)?;
    emit(&HouseOutput { longitude, house }, pretty)
}

#[derive(Serialize)]
struct OrbOutput {
    profile: ProfileId,
    aspect: AspectType,
    body_a: String,
    body_b: String,
    effective_orb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    within_orb: Option<bool>,
}

fn cmd_orb(
    aspect: &str,
    body_a: &str,
    body_b: &str,
    profile: &str,
    orb: Option<f64>,
    pretty: bool,
) -> Result<(), WeatherCliError> {
    let profile_id = ProfileId::resolve(profile);
    let resolved = orb_profile(profile_id);
    let aspect_type = AspectType::from_name(aspect);
    let effective_orb = resolved.effective_orb(&aspect_type, body_a, body_b);
    let within_orb =
        orb.map(|o| resolved.is_within_orb(&Aspect::new(body_a, body_b, aspect_type.clone(), o)));

    emit(
        &OrbOutput {
            profile: profile_id,
            aspect: aspect_type,
            body_a: body_a.to_string(),
            body_b: body_b.to_string(),
            effective_orb,
            within_orb,
        },
        pretty,
    )
}

fn cmd_render(input: &Path, config: &RendererConfig, pretty: bool) -> Result<(), WeatherCliError> {
    let days: Vec<DayMetricsInput> = serde_json::from_str(&read_input(input)?)?;
    let result = render_symbolic_weather(&days, config)?;
    for alert in &result.observability.alerts {
        tracing::warn!("{alert}");
    }
    emit(&result, pretty)
}

fn parse_civil(date: &str) -> Result<CivilDateTime, WeatherCliError> {
    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .ok_or_else(|| EngineError::DateParseError(date.to_string()))?;
    Ok(CivilDateTime::new(
        naive.year(),
        naive.month(),
        naive.day(),
        naive.hour(),
        naive.minute(),
        naive.second(),
    ))
}

fn read_input(path: &Path) -> Result<String, WeatherCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<(), WeatherCliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

// Error types

#[derive(Debug)]
enum WeatherCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    BadArgument(String),
}

impl From<io::Error> for WeatherCliError {
    fn from(e: io::Error) -> Self {
        WeatherCliError::Io(e)
    }
}

impl From<EngineError> for WeatherCliError {
    fn from(e: EngineError) -> Self {
        WeatherCliError::Engine(e)
    }
}

impl From<serde_json::Error> for WeatherCliError {
    fn from(e: serde_json::Error) -> Self {
        WeatherCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WeatherCliError> for CliError {
    fn from(e: WeatherCliError) -> Self {
        match e {
            WeatherCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WeatherCliError::Engine(e) if e.is_input_error() => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check dates, timezones and coordinates".to_string()),
            },
            WeatherCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            WeatherCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WeatherCliError::BadArgument(message) => CliError {
                code: "BAD_ARGUMENT".to_string(),
                message,
                hint: Some("Run 'weather --help' for usage".to_string()),
            },
        }
    }
}
