//! Configuration for the laser touch feed.
//!
//! Configuration is read once at startup and replaced wholesale afterwards:
//! [`Config::diff`] turns a replacement into typed [`ConfigChange`] events,
//! which the application context applies one by one.

use crate::core::clustering::{DEFAULT_MIN_RUN_LENGTH, DEFAULT_RESAMPLE_COUNT};
use crate::core::geometry::{OutputSize, ScreenSurface};
use crate::emitter::{SendingMode, DEFAULT_ADDRESS};
use crate::sensor::{Direction, ScanParameters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Placement and size of the physical screen
    pub surface: SurfaceConfig,

    /// Pixel size of the output surface
    pub output: OutputConfig,

    /// Reflect scans across the facing axis
    pub mirror: bool,

    /// Sweep angle range and angular step
    pub scan: ScanParameters,

    pub clustering: ClusteringConfig,

    /// Which output set is sent and how
    pub sending_mode: SendingMode,

    /// Where touch messages are sent
    pub osc: OscConfig,

    /// Pipeline ticks per second
    pub tick_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            output: OutputConfig::default(),
            mirror: true,
            scan: ScanParameters::default(),
            clustering: ClusteringConfig::default(),
            sending_mode: SendingMode::default(),
            osc: OscConfig::default(),
            tick_hz: 60,
        }
    }
}

/// Screen placement relative to the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub facing: Direction,
    pub standoff_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            facing: Direction::Down,
            standoff_mm: 0.0,
            width_mm: 4000.0,
            height_mm: 3000.0,
        }
    }
}

impl SurfaceConfig {
    pub fn to_surface(&self) -> ScreenSurface {
        ScreenSurface::new(self.facing, self.standoff_mm, self.width_mm, self.height_mm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width_px: 1280,
            height_px: 800,
        }
    }
}

impl OutputConfig {
    pub fn size(&self) -> OutputSize {
        OutputSize::new(self.width_px as f32, self.height_px as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Shortest run of inside points that forms a cluster
    pub min_run_length: usize,
    /// Vertex count each run is resampled to
    pub resample_count: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            resample_count: DEFAULT_RESAMPLE_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub host: String,
    pub port: u16,
    pub address: String,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            address: DEFAULT_ADDRESS.to_string(),
        }
    }
}

/// A single effective difference between two configurations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigChange {
    /// Standoff or screen dimensions changed
    SurfaceChanged,
    DirectionChanged(Direction),
    MirrorChanged(bool),
    /// Sweep angles or step changed; the scanner must be restarted
    ScanChanged(ScanParameters),
    ClusteringChanged(ClusteringConfig),
    OutputSizeChanged(OutputConfig),
    SendingModeChanged(SendingMode),
    /// Host or port changed; the transport must be rebuilt
    TransportChanged { host: String, port: u16 },
    AddressChanged(String),
    TickRateChanged(u32),
}

/// Settings forced from the command line.
///
/// They sit on top of whatever the file says, at startup and again on every
/// reload, so editing the file never undoes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub sending_mode: Option<SendingMode>,
    pub facing: Option<Direction>,
    pub no_mirror: bool,
}

impl Overrides {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.osc.host = host.clone();
        }
        if let Some(port) = self.port {
            config.osc.port = port;
        }
        if let Some(mode) = self.sending_mode {
            config.sending_mode = mode;
        }
        if let Some(facing) = self.facing {
            config.surface.facing = facing;
        }
        if self.no_mirror {
            config.mirror = false;
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("laser-touch")
            .join("config.json")
    }

    /// Reject values outside the supported ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("surface.standoff_mm", self.surface.standoff_mm, 0.0, 2000.0)?;
        check_range("surface.width_mm", self.surface.width_mm, 1000.0, 5000.0)?;
        check_range("surface.height_mm", self.surface.height_mm, 1000.0, 5000.0)?;
        check_range("output.width_px", self.output.width_px, 1024, 1920)?;
        check_range("output.height_px", self.output.height_px, 768, 1200)?;
        check_range("scan.step", self.scan.step, 1, 10)?;
        check_range("scan.min_angle_deg", self.scan.min_angle_deg, -180.0, 180.0)?;
        check_range("scan.max_angle_deg", self.scan.max_angle_deg, -180.0, 180.0)?;
        if self.scan.min_angle_deg >= self.scan.max_angle_deg {
            return Err(ConfigError::Invalid(
                "scan.min_angle_deg must be below scan.max_angle_deg".to_string(),
            ));
        }
        check_range("clustering.min_run_length", self.clustering.min_run_length, 1, usize::MAX)?;
        check_range("clustering.resample_count", self.clustering.resample_count, 1, usize::MAX)?;
        check_range("tick_hz", self.tick_hz, 1, 240)?;
        if self.osc.host.trim().is_empty() {
            return Err(ConfigError::Invalid("osc.host must not be empty".to_string()));
        }
        if !self.osc.address.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "osc.address must start with '/', got {:?}",
                self.osc.address
            )));
        }
        Ok(())
    }

    /// Changes needed to go from `self` to `new`, in application order.
    pub fn diff(&self, new: &Config) -> Vec<ConfigChange> {
        let mut changes = Vec::new();

        if self.surface.facing != new.surface.facing {
            changes.push(ConfigChange::DirectionChanged(new.surface.facing));
        }
        if self.surface.standoff_mm != new.surface.standoff_mm
            || self.surface.width_mm != new.surface.width_mm
            || self.surface.height_mm != new.surface.height_mm
        {
            changes.push(ConfigChange::SurfaceChanged);
        }
        if self.mirror != new.mirror {
            changes.push(ConfigChange::MirrorChanged(new.mirror));
        }
        if self.scan != new.scan {
            changes.push(ConfigChange::ScanChanged(new.scan));
        }
        if self.clustering != new.clustering {
            changes.push(ConfigChange::ClusteringChanged(new.clustering));
        }
        if self.output != new.output {
            changes.push(ConfigChange::OutputSizeChanged(new.output));
        }
        if self.sending_mode != new.sending_mode {
            changes.push(ConfigChange::SendingModeChanged(new.sending_mode));
        }
        if self.osc.host != new.osc.host || self.osc.port != new.osc.port {
            changes.push(ConfigChange::TransportChanged {
                host: new.osc.host.clone(),
                port: new.osc.port,
            });
        }
        if self.osc.address != new.osc.address {
            changes.push(ConfigChange::AddressChanged(new.osc.address.clone()));
        }
        if self.tick_hz != new.tick_hz {
            changes.push(ConfigChange::TickRateChanged(new.tick_hz));
        }

        changes
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} = {value} is outside {min}..={max}"
        )))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
