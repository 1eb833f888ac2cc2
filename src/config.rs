//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the lunar-config.toml file.
//! It describes the observer (coordinates, altitude, time zone), the horizon
//! model used for moonrise/moonset, and what the almanac report shows.
//!
//! ```toml
//! [observer]
//! name = "Greenwich"
//! latitude = 51.4769
//! longitude = -0.0005
//! altitude_m = 46.0
//! zone = "Europe/London"
//!
//! [horizon]
//! refraction_arcmin = 34.0
//! altitude_correction = true
//!
//! [report]
//! days = 7
//! precision = 2
//! chart_window_days = 15
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::LunarError;
use crate::horizon::HorizonConfig;
use crate::location::GeoLocation;
use crate::rise_set::LunarTime;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "lunar-config.toml";

/// Widest chart half-window whose hour offsets still fit the sample type.
pub const MAX_CHART_WINDOW_DAYS: u16 = (i16::MAX / 24) as u16;

/// Application configuration loaded from lunar-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Where the Moon is observed from
    pub observer: ObserverConfig,
    /// Horizon model for rise/set searches
    #[serde(default)]
    pub horizon: HorizonConfig,
    /// Almanac output options
    #[serde(default)]
    pub report: ReportConfig,
}

/// Observer location and civil time zone
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObserverConfig {
    /// Human-readable place name for report headings
    pub name: String,
    /// Latitude in decimal degrees, north positive
    pub latitude: f64,
    /// Longitude in decimal degrees, east positive
    pub longitude: f64,
    /// Height above sea level in metres
    #[serde(default)]
    pub altitude_m: f64,
    /// IANA zone name such as "Europe/Berlin"; civil days follow this zone
    pub zone: String,
}

/// Almanac report options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of civil days in the rise/set table
    pub days: u32,
    /// Decimal digits of the published illumination (0..=15)
    pub precision: u32,
    /// Half-width of the illumination chart in days
    pub chart_window_days: u16,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            days: 7,
            precision: 2,
            chart_window_days: 15,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            observer: ObserverConfig {
                name: "Greenwich".to_string(),
                latitude: 51.4769,
                longitude: -0.0005,
                altitude_m: 46.0,
                zone: "Europe/London".to_string(),
            },
            horizon: HorizonConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl ObserverConfig {
    /// Validated observer position.
    pub fn location(&self) -> Result<GeoLocation, LunarError> {
        GeoLocation::with_altitude(self.latitude, self.longitude, self.altitude_m)
    }

    /// Named IANA time zone.
    pub fn time_zone(&self) -> Result<chrono_tz::Tz, LunarError> {
        self.zone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| LunarError::invalid(format!("unknown time zone {:?}: {e}", self.zone)))
    }
}

impl Config {
    /// Load configuration from lunar-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded configuration for observer: {}", config.observer.name);
                    config
                }
                Err(e) => {
                    warn!("{e}");
                    warn!("Using default configuration (Greenwich)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration (Greenwich)");
                Self::default()
            }
        }
    }

    /// Parse TOML text; the observer must describe a valid location and zone.
    pub fn parse(contents: &str) -> Result<Self, LunarError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| LunarError::Config(format!("invalid config file format: {e}")))?;
        config
            .observer
            .location()
            .and_then(|_| config.observer.time_zone())
            .map_err(|e| LunarError::Config(e.to_string()))?;
        if config.report.precision > crate::phase::MAX_PRECISION {
            return Err(LunarError::Config(format!(
                "report precision {} exceeds {}",
                config.report.precision,
                crate::phase::MAX_PRECISION
            )));
        }
        if config.report.chart_window_days > MAX_CHART_WINDOW_DAYS {
            return Err(LunarError::Config(format!(
                "chart window of {} days exceeds {MAX_CHART_WINDOW_DAYS}",
                config.report.chart_window_days
            )));
        }
        Ok(config)
    }

    /// Rise/set calculator for the configured observer, zone and horizon.
    pub fn lunar_time(&self) -> Result<LunarTime<chrono_tz::Tz>, LunarError> {
        let location = self.observer.location()?;
        let zone = self.observer.time_zone()?;
        Ok(LunarTime::from_location(location, zone).with_horizon(self.horizon))
    }

    /// Save current configuration to lunar-config.toml
    pub fn save(&self) -> Result<(), LunarError> {
        self.save_to_path(CONFIG_FILE)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), LunarError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| LunarError::Config(e.to_string()))?;
        fs::write(&path, contents).map_err(|e| {
            LunarError::Config(format!("cannot write {}: {e}", path.as_ref().display()))
        })?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
