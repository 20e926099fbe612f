//! METAR observation types as decoded from the aviationweather.gov JSON API.
//!
//! The API is loose about types: `visib` is a number (`0.25`, `3`) or a
//! string (`"10+"`, `"1 1/2"`), and `clouds[].base` may be `null`. Everything
//! the classifier needs is normalised here so that "absent" stays distinct
//! from zero.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Prevailing visibility in statute miles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// Distance in statute miles.
    pub distance: f64,
    /// Reported as "at least" (`10+`). Display only; thresholds ignore it.
    pub greater_than: bool,
}

impl Visibility {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            greater_than: false,
        }
    }

    pub fn at_least(distance: f64) -> Self {
        Self {
            distance,
            greater_than: true,
        }
    }

    /// Checked constructor: the distance must be finite and not negative.
    pub fn from_distance(distance: f64) -> Result<Self, ParseVisibilityError> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(ParseVisibilityError(distance.to_string()));
        }
        Ok(Self::new(distance))
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.greater_than {
            write!(f, "{}+SM", self.distance)
        } else {
            write!(f, "{}SM", self.distance)
        }
    }
}

/// Error returned when a visibility string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid visibility: {0:?}")]
pub struct ParseVisibilityError(String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    /// Accepts `10`, `10+`, `1/4`, `1 1/2` and `M1/4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVisibilityError(s.to_string());

        let trimmed = s.trim();
        let (body, greater_than) = match trimmed.strip_suffix('+') {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };
        // "M1/4" is "less than 1/4"; the value itself is what matters here.
        let body = body.strip_prefix('M').unwrap_or(body);
        if body.is_empty() {
            return Err(err());
        }

        let mut distance = 0.0;
        for part in body.split_whitespace() {
            distance += match part.split_once('/') {
                Some((num, den)) => {
                    let num: f64 = num.parse().map_err(|_| err())?;
                    let den: f64 = den.parse().map_err(|_| err())?;
                    if den == 0.0 {
                        return Err(err());
                    }
                    num / den
                }
                None => part.parse::<f64>().map_err(|_| err())?,
            };
        }

        let visibility = Self::from_distance(distance).map_err(|_| err())?;
        Ok(Self {
            greater_than,
            ..visibility
        })
    }
}

/// Sky cover of a single cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudCover {
    Clear,
    Few,
    Scattered,
    Broken,
    Overcast,
    /// Sky obscured (`OVX`, or a vertical visibility report).
    Obscured,
}

impl CloudCover {
    /// Broken, overcast and obscured layers form a ceiling.
    pub fn is_ceiling(self) -> bool {
        matches!(
            self,
            CloudCover::Broken | CloudCover::Overcast | CloudCover::Obscured
        )
    }

    pub fn code(self) -> &'static str {
        match self {
            CloudCover::Clear => "CLR",
            CloudCover::Few => "FEW",
            CloudCover::Scattered => "SCT",
            CloudCover::Broken => "BKN",
            CloudCover::Overcast => "OVC",
            CloudCover::Obscured => "OVX",
        }
    }
}

impl FromStr for CloudCover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLR" | "SKC" | "NSC" | "NCD" | "CAVOK" => Ok(CloudCover::Clear),
            "FEW" => Ok(CloudCover::Few),
            "SCT" => Ok(CloudCover::Scattered),
            "BKN" => Ok(CloudCover::Broken),
            "OVC" => Ok(CloudCover::Overcast),
            "OVX" | "VV" => Ok(CloudCover::Obscured),
            other => Err(format!("unknown cloud cover code: {}", other)),
        }
    }
}

impl fmt::Display for CloudCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One reported cloud layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudLayer {
    pub cover: CloudCover,
    /// Layer base in feet above ground level, if reported.
    pub base: Option<f64>,
}

impl CloudLayer {
    pub fn new(cover: CloudCover, base: Option<f64>) -> Self {
        Self { cover, base }
    }
}

/// A single weather report for one station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireMetar")]
pub struct Observation {
    /// ICAO station identifier, e.g. `KBOS`.
    pub station_id: String,
    pub visibility: Option<Visibility>,
    /// Layers in reported order.
    pub clouds: Vec<CloudLayer>,
    /// Raw METAR text, kept for logging.
    pub raw_text: Option<String>,
    /// Station name, kept for logging.
    pub name: Option<String>,
}

impl Observation {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            visibility: None,
            clouds: Vec::new(),
            raw_text: None,
            name: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_layer(mut self, cover: CloudCover, base: Option<f64>) -> Self {
        self.clouds.push(CloudLayer::new(cover, base));
        self
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireVisibility {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireCloud {
    cover: String,
    #[serde(default)]
    base: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireMetar {
    #[serde(rename = "icaoId")]
    icao_id: String,
    #[serde(default)]
    visib: Option<WireVisibility>,
    #[serde(default)]
    clouds: Option<Vec<WireCloud>>,
    #[serde(default, rename = "rawOb")]
    raw_ob: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<WireMetar> for Observation {
    fn from(wire: WireMetar) -> Self {
        let parsed = match wire.visib {
            Some(WireVisibility::Number(distance)) => Some(Visibility::from_distance(distance)),
            Some(WireVisibility::Text(text)) => Some(text.parse::<Visibility>()),
            None => None,
        };
        let visibility = match parsed {
            Some(Ok(v)) => Some(v),
            Some(Err(e)) => {
                log::debug!("[Metar] {}: {}", wire.icao_id, e);
                None
            }
            None => None,
        };

        let clouds = wire
            .clouds
            .unwrap_or_default()
            .into_iter()
            .filter_map(|layer| match layer.cover.parse::<CloudCover>() {
                Ok(cover) => Some(CloudLayer::new(cover, layer.base)),
                Err(e) => {
                    log::debug!("[Metar] {}: skipping layer, {}", wire.icao_id, e);
                    None
                }
            })
            .collect();

        Observation {
            station_id: wire.icao_id,
            visibility,
            clouds,
            raw_text: wire.raw_ob,
            name: wire.name,
        }
    }
}
