//! Severity → RGB mapping and the per-refresh color frame.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::metar::Severity;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Reserved "LED off" color.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Packed `0x00RRGGBB` word as WS281x drivers expect it.
    pub fn to_u32(self) -> u32 {
        ((self.red as u32) << 16) | ((self.green as u32) << 8) | self.blue as u32
    }

    /// Linear brightness scale, 255 = unchanged.
    pub fn scaled(self, brightness: u8) -> Rgb {
        let scale = |c: u8| ((c as u16 * brightness as u16) / 255) as u8;
        Rgb::new(scale(self.red), scale(self.green), scale(self.blue))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Severity → color lookup.
///
/// An override table that leaves a severity out maps it to [`Rgb::OFF`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTable(HashMap<Severity, Rgb>);

impl Default for ColorTable {
    fn default() -> Self {
        Self::from_entries([
            (Severity::Unknown, Rgb::OFF),
            (Severity::Visual, Rgb::new(0, 255, 0)),
            (Severity::MarginalVisual, Rgb::new(0, 0, 255)),
            (Severity::Instrument, Rgb::new(255, 0, 0)),
            (Severity::LowInstrument, Rgb::new(255, 0, 255)),
        ])
    }
}

impl ColorTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (Severity, Rgb)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn color(&self, severity: Severity) -> Rgb {
        self.0.get(&severity).copied().unwrap_or(Rgb::OFF)
    }
}

/// One complete strip state: LED position → color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorFrame {
    leds: BTreeMap<usize, Rgb>,
}

impl ColorFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every given position set to [`Rgb::OFF`].
    pub fn off(positions: impl IntoIterator<Item = usize>) -> Self {
        Self::filled(positions, Rgb::OFF)
    }

    pub fn filled(positions: impl IntoIterator<Item = usize>, color: Rgb) -> Self {
        Self {
            leds: positions.into_iter().map(|p| (p, color)).collect(),
        }
    }

    pub fn set(&mut self, position: usize, color: Rgb) {
        self.leds.insert(position, color);
    }

    pub fn get(&self, position: usize) -> Option<Rgb> {
        self.leds.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    /// Entries in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Rgb)> + '_ {
        self.leds.iter().map(|(p, c)| (*p, *c))
    }

    pub fn is_all_off(&self) -> bool {
        self.leds.values().all(|c| *c == Rgb::OFF)
    }
}

impl FromIterator<(usize, Rgb)> for ColorFrame {
    fn from_iter<I: IntoIterator<Item = (usize, Rgb)>>(iter: I) -> Self {
        Self {
            leds: iter.into_iter().collect(),
        }
    }
}

/// Build a frame from per-position severities.
///
/// Uses [`ColorTable::default`] when `table` is `None`. The frame has
/// exactly the positions of `severities`.
pub fn to_frame(table: Option<&ColorTable>, severities: &BTreeMap<usize, Severity>) -> ColorFrame {
    let default_table;
    let table = match table {
        Some(t) => t,
        None => {
            default_table = ColorTable::default();
            &default_table
        }
    };

    severities
        .iter()
        .map(|(position, severity)| (*position, table.color(*severity)))
        .collect()
}
