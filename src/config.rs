//! Tunables read from an optional JSON settings file. Every field may be
//! omitted; missing values fall back to the defaults below.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use tracing::debug;

use crate::orbital::SpinPalette;
use crate::sampler::SamplerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
    pub sampler: SamplerConfig,
    pub palette: SpinPalette,
    /// Spread generation over the rayon pool.
    pub parallel: bool,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ServerConfig {
    #[default = "127.0.0.1"]
    pub host: String,
    #[default = 3000]
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("bad server address {}:{}: {e}", self.host, self.port))
    }
}

impl Settings {
    /// Rejects values that would put samples off the r >= 0 domain or
    /// colors outside [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        let scale = self.sampler.radial_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(format!("sampler.radial_scale must be a positive number, got {scale}"));
        }
        for (name, color) in [("up", self.palette.up), ("down", self.palette.down)] {
            if !color.iter().all(|c| (0.0..=1.0).contains(c)) {
                return Err(format!("palette.{name} channels must lie in [0, 1], got {color:?}"));
            }
        }
        Ok(())
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, String> {
    let span = tracing::span!(tracing::Level::INFO, "load_settings");
    let _enter = span.enter();

    let file = File::open(path).map_err(|e| format!("open {}: {e}", path.display()))?;
    debug!("Reading settings from {}", path.display());
    let settings: Settings = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("parse {}: {e}", path.display()))?;
    settings
        .validate()
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(settings)
}

/// Loads `path` when given, otherwise returns the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(path) => load_settings(path),
        None => Ok(Settings::default()),
    }
}
