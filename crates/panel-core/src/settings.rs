//! Panel settings
//!
//! Settings come from a `key=value` text file on removable storage. Parsing is
//! best effort: every field starts at a hard-coded fallback and a bad line
//! only leaves its own field at the prior value.
//!
//! ```text
//! // Studio B panel
//! routing_sources=3,7,12,1,40,22
//! routing_destination=9
//! router_ip=10.0.0.5
//! router_port=9990
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::events::SWITCHER_PORTS;
use crate::state::{PanelState, PANEL_BUTTONS};

/// Config file name under the storage mount point
pub const CONFIG_FILE: &str = "config.txt";

/// Problem with a single config line
///
/// These are reported and skipped; they never abort loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsWarning {
    /// `key=` with nothing after the equals sign
    #[error("formatting error in {key}: missing value")]
    MissingValue { key: String },

    /// Value could not be parsed or is out of range
    #[error("formatting error in {key}: invalid value '{value}'")]
    InvalidValue { key: String, value: String },

    /// Fewer than six sources listed
    #[error("formatting error in routing_sources: expected 6 values, found {found}")]
    TooFewSources { found: usize },
}

/// Address of the switcher's control port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Default for RouterEndpoint {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::new(192, 168, 11, 41),
            port: 9990,
        }
    }
}

impl fmt::Display for RouterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Routing configuration for the panel
///
/// Source and destination numbers are 1-based, as printed on the switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSettings")]
pub struct Settings {
    /// Switcher input (1-40) selected by each button
    pub routing_sources: [u8; PANEL_BUTTONS],
    /// Switcher output (1-40) this panel controls
    pub routing_destination: u8,
    /// Switcher control endpoint
    pub router: RouterEndpoint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            routing_sources: [1, 2, 3, 4, 5, 6],
            routing_destination: 5,
            router: RouterEndpoint::default(),
        }
    }
}

/// Deserialized form, range-checked before it becomes [`Settings`]
#[derive(Deserialize)]
struct UncheckedSettings {
    routing_sources: [u8; PANEL_BUTTONS],
    routing_destination: u8,
    router: RouterEndpoint,
}

impl TryFrom<UncheckedSettings> for Settings {
    type Error = SettingsWarning;

    fn try_from(raw: UncheckedSettings) -> Result<Self, Self::Error> {
        for source in raw.routing_sources {
            check_port_number("routing_sources", source)?;
        }
        check_port_number("routing_destination", raw.routing_destination)?;

        Ok(Self {
            routing_sources: raw.routing_sources,
            routing_destination: raw.routing_destination,
            router: raw.router,
        })
    }
}

/// Result of parsing a config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSettings {
    pub settings: Settings,
    pub warnings: Vec<SettingsWarning>,
}

impl Settings {
    /// Parse config text on top of the fallback values
    pub fn parse(text: &str) -> ParsedSettings {
        let mut settings = Settings::default();
        let mut warnings = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with("//") {
                continue;
            }

            debug!("Read line from config: '{}'", line);
            if let Err(warning) = settings.apply_line(line) {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        ParsedSettings { settings, warnings }
    }

    /// Apply one `key=value` line
    ///
    /// On error the affected field keeps its prior value. For
    /// `routing_sources` the values that did parse are kept.
    pub fn apply_line(&mut self, line: &str) -> Result<(), SettingsWarning> {
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line.trim(), ""),
        };

        match key {
            "routing_sources" => self.apply_sources(value),
            "routing_destination" => {
                self.routing_destination = parse_port_number(key, value)?;
                Ok(())
            }
            "router_ip" => {
                self.router.ip = parse_value(key, value)?;
                Ok(())
            }
            "router_port" => {
                self.router.port = parse_value(key, value)?;
                Ok(())
            }
            _ => {
                debug!("Ignoring unknown config key '{}'", key);
                Ok(())
            }
        }
    }

    fn apply_sources(&mut self, value: &str) -> Result<(), SettingsWarning> {
        const KEY: &str = "routing_sources";

        if value.is_empty() {
            return Err(SettingsWarning::MissingValue {
                key: KEY.to_string(),
            });
        }

        let mut first_error = None;
        let mut found = 0;
        for (slot, item) in self.routing_sources.iter_mut().zip(value.split(',')) {
            found += 1;
            match parse_port_number(KEY, item.trim()) {
                Ok(source) => *slot = source,
                Err(e) => {
                    warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if found < PANEL_BUTTONS {
            return Err(SettingsWarning::TooFewSources { found });
        }
        Ok(())
    }

    /// Button whose configured source is `source` (1-based), or none
    ///
    /// If several buttons share a source the lowest-numbered one wins.
    pub fn button_for_source(&self, source: u8) -> PanelState {
        self.routing_sources
            .iter()
            .position(|&s| s == source)
            .and_then(PanelState::from_index)
            .unwrap_or(PanelState::NONE)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsWarning> {
    if value.is_empty() {
        return Err(SettingsWarning::MissingValue {
            key: key.to_string(),
        });
    }
    value.parse().map_err(|_| SettingsWarning::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a 1-based switcher port number (1-40)
fn parse_port_number(key: &str, value: &str) -> Result<u8, SettingsWarning> {
    let number: u8 = parse_value(key, value)?;
    check_port_number(key, number)
}

fn check_port_number(key: &str, number: u8) -> Result<u8, SettingsWarning> {
    if number == 0 || number > SWITCHER_PORTS {
        return Err(SettingsWarning::InvalidValue {
            key: key.to_string(),
            value: number.to_string(),
        });
    }
    Ok(number)
}

/// Load settings from the storage mount point
///
/// Falls back to the defaults if the file is missing or unreadable.
pub fn load_settings(mount_point: &Path) -> Settings {
    load_settings_file(&mount_point.join(CONFIG_FILE))
}

/// Load settings from an explicit file path
pub fn load_settings_file(path: &Path) -> Settings {
    info!("Reading settings from {}", path.display());

    if !path.exists() {
        warn!(
            "Settings file {} not found, using fallback values",
            path.display()
        );
        return Settings::default();
    }

    // Lines that are not UTF-8 decode with replacement characters and then
    // fail on their own like any other malformed line
    match std::fs::read(path) {
        Ok(bytes) => {
            let parsed = Settings::parse(&String::from_utf8_lossy(&bytes));
            info!(
                "Settings loaded: sources {:?}, destination {}, router {} ({} warnings)",
                parsed.settings.routing_sources,
                parsed.settings.routing_destination,
                parsed.settings.router,
                parsed.warnings.len()
            );
            parsed.settings
        }
        Err(e) => {
            error!(
                "Settings file {} read failed ({}), using fallback values",
                path.display(),
                e
            );
            Settings::default()
        }
    }
}
