//! YAML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. [`Config::serve_settings`] turns the raw values into
//! what the weather pipeline needs and rejects anything inconsistent.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::color::{ColorFrame, ColorTable};
use crate::metar::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::schedule::CronSchedule;
use crate::stations::StationIndexMap;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Strip hardware settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Number of LEDs on the strip
    pub count: usize,
    /// 0-255, applied by the renderer
    pub brightness: u8,
    /// GPIO pin wired to the strip's data input
    pub gpio_pin: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            count: 300,
            brightness: 128,
            gpio_pin: 18,
        }
    }
}

/// Settings for the `serve` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// 5-field (seconds pinned to 0) or 6-field cron expression
    pub refresh_cron: String,
    /// Station ids; comma separated entries are split
    pub airport_ids: Vec<String>,
    /// `ID=index` pairs; comma separated entries are split
    pub led_indexes: Vec<String>,
    /// Overrides the default category colors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorTable>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            refresh_cron: "*/15 * * * *".to_string(),
            airport_ids: vec!["KBOS,KJFK,KSFO,KORD".to_string()],
            led_indexes: Vec::new(),
            colors: None,
        }
    }
}

/// METAR data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetarConfig {
    pub base_url: String,
    /// 0 means the default timeout
    pub timeout_seconds: u64,
}

impl Default for MetarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub led: LedConfig,
    pub serve: ServeConfig,
    pub metar: MetarConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            led: LedConfig::default(),
            serve: ServeConfig::default(),
            metar: MetarConfig::default(),
        }
    }
}

/// Validated inputs of the weather pipeline.
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub schedule: CronSchedule,
    pub stations: Arc<StationIndexMap>,
    pub fetch_timeout: Duration,
    pub colors: ColorTable,
    pub base_url: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load from `path`, or use defaults if the file doesn't exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Config file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Check and resolve the `serve` section.
    pub fn serve_settings(&self) -> Result<ServeSettings, ConfigError> {
        let schedule = CronSchedule::parse(&self.serve.refresh_cron).map_err(|e| {
            ConfigError::ValidationError(format!("unable to parse refresh cron schedule: {}", e))
        })?;

        let airport_ids = explode(&self.serve.airport_ids);
        if airport_ids.is_empty() {
            return Err(ConfigError::ValidationError(
                "no airport ids configured".to_string(),
            ));
        }

        let explicit = explode(&self.serve.led_indexes)
            .iter()
            .map(|pair| parse_led_index(pair))
            .collect::<Result<Vec<_>, _>>()?;

        let stations = StationIndexMap::assign(&airport_ids, &explicit)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if let Some((id, position)) = stations.iter().find(|(_, p)| *p >= self.led.count) {
            return Err(ConfigError::ValidationError(format!(
                "LED index of {} must be below LED count: {} >= {}",
                id, position, self.led.count
            )));
        }

        let fetch_timeout = match self.metar.timeout_seconds {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        };

        Ok(ServeSettings {
            schedule,
            stations: Arc::new(stations),
            fetch_timeout,
            colors: self.serve.colors.clone().unwrap_or_default(),
            base_url: self.metar.base_url.clone(),
        })
    }

    /// Reject positions past the end of the strip.
    pub fn check_position(&self, position: usize) -> Result<usize, ConfigError> {
        if position >= self.led.count {
            return Err(ConfigError::ValidationError(format!(
                "LED index must be below LED count: {} >= {}",
                position, self.led.count
            )));
        }
        Ok(position)
    }

    /// Every LED on the strip set to off.
    pub fn off_frame(&self) -> ColorFrame {
        ColorFrame::off(0..self.led.count)
    }
}

fn explode(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_led_index(pair: &str) -> Result<(String, usize), ConfigError> {
    let (id, index) = pair
        .split_once('=')
        .filter(|(id, index)| !id.trim().is_empty() && !index.contains('='))
        .ok_or_else(|| ConfigError::ValidationError(format!("invalid LED index format: {}", pair)))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::ValidationError(format!("invalid LED index value: {}", index)))?;
    Ok((id.trim().to_string(), index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::metar::Severity;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.led.count, 300);
        assert_eq!(config.led.brightness, 128);
        assert_eq!(config.led.gpio_pin, 18);

        let settings = config.serve_settings().unwrap();
        assert_eq!(settings.schedule.expression(), "*/15 * * * *");
        assert_eq!(
            settings.stations.station_ids(),
            vec!["KBOS", "KJFK", "KSFO", "KORD"]
        );
        assert_eq!(settings.fetch_timeout, Duration::from_secs(15));
        assert_eq!(settings.base_url, "https://aviationweather.gov/api/data");
        assert_eq!(settings.colors, ColorTable::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
log_level: debug
led:
  count: 50
  brightness: 255
serve:
  refresh_cron: "0 */5 * * * *"
  airport_ids: ["KBOS, KJFK", "KSFO"]
  led_indexes: ["KJFK=10,KSFO=3"]
  colors:
    vfr: { red: 0, green: 64, blue: 0 }
metar:
  base_url: "http://localhost:8080/api"
  timeout_seconds: 3
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.led.count, 50);
        assert_eq!(config.led.gpio_pin, 18); // default

        let settings = config.serve_settings().unwrap();
        assert_eq!(settings.stations.position("KBOS"), Some(0));
        assert_eq!(settings.stations.position("KJFK"), Some(10));
        assert_eq!(settings.stations.position("KSFO"), Some(3));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(3));
        assert_eq!(settings.colors.color(Severity::Visual), Rgb::new(0, 64, 0));
        assert_eq!(settings.colors.color(Severity::Instrument), Rgb::OFF);
        assert_eq!(settings.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = Config::parse("metar:\n  timeout_seconds: 0\n").unwrap();
        assert_eq!(config.serve_settings().unwrap().fetch_timeout, DEFAULT_TIMEOUT);
    }

    fn validation_error(yaml: &str) -> String {
        match Config::parse(yaml).unwrap().serve_settings() {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_cron() {
        let msg = validation_error("serve:\n  refresh_cron: \"every minute\"\n");
        assert!(msg.contains("refresh cron"));
    }

    #[test]
    fn test_invalid_led_index() {
        assert!(validation_error("serve:\n  led_indexes: [\"KBOS\"]\n").contains("format"));
        assert!(validation_error("serve:\n  led_indexes: [\"KBOS=1=2\"]\n").contains("format"));
        assert!(validation_error("serve:\n  led_indexes: [\"KBOS=x\"]\n").contains("value"));
        assert!(validation_error("serve:\n  led_indexes: [\"KBOS=-1\"]\n").contains("value"));
    }

    #[test]
    fn test_duplicate_positions() {
        let msg = validation_error("serve:\n  led_indexes: [\"KSFO=1\"]\n");
        assert!(msg.contains("KJFK") && msg.contains("KSFO"));
    }

    #[test]
    fn test_repeated_airport_id() {
        let config =
            Config::parse("serve:\n  airport_ids: [\"KBOS,KJFK\", \"KBOS\", \"KSFO\"]\n").unwrap();
        let settings = config.serve_settings().unwrap();
        assert_eq!(settings.stations.len(), 3);
        assert_eq!(settings.stations.position("KBOS"), Some(0));
        assert_eq!(settings.stations.position("KJFK"), Some(1));
        assert_eq!(settings.stations.position("KSFO"), Some(2));
    }

    #[test]
    fn test_position_beyond_strip() {
        let msg = validation_error("led:\n  count: 3\n");
        assert!(msg.contains("KORD"));
    }

    #[test]
    fn test_empty_airports() {
        let msg = validation_error("serve:\n  airport_ids: [\" , \"]\n");
        assert!(msg.contains("no airport"));
    }

    #[test]
    fn test_unparseable_yaml() {
        assert!(matches!(
            Config::parse("led: [1, 2"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "led:\n  count: 12").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.led.count, 12);
        assert_eq!(config.off_frame().len(), 12);
        assert!(config.off_frame().is_all_off());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());

        assert!(matches!(
            Config::from_file(dir.path().join("config.yaml")),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_check_position() {
        let config = Config::default();
        assert_eq!(config.check_position(299).unwrap(), 299);
        assert!(config.check_position(300).is_err());
    }
}
