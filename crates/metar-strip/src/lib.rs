//! METAR Strip
//!
//! Shows aviation weather on an addressable LED strip: one LED per airport,
//! colored by the flight category of its latest METAR and refreshed on a
//! cron schedule.
//!
//! # Overview
//!
//! - [`metar`] fetches observations and classifies them
//!   (VFR / MVFR / IFR / LIFR / unknown)
//! - [`color`] maps categories to RGB frames
//! - [`pipeline`] runs a producer and a render consumer with shared shutdown
//! - [`strip`] is the output side
//!
//! # Example Config
//!
//! ```yaml
//! led:
//!   count: 50
//! serve:
//!   refresh_cron: "*/15 * * * *"
//!   airport_ids: ["KBOS,KJFK", "KSFO"]
//!   led_indexes: ["KSFO=20"]
//! ```

pub mod color;
pub mod config;
pub mod demo;
pub mod metar;
pub mod pipeline;
pub mod schedule;
pub mod stations;
pub mod strip;

pub use color::{ColorFrame, ColorTable, Rgb};
pub use config::{Config, ConfigError, ServeSettings};
pub use metar::{classify, MetarClient, Observation, Severity, WeatherSource};
pub use pipeline::{supervise, PipelineError, Producer, Refresher};
pub use schedule::{CronSchedule, Schedule};
pub use stations::StationIndexMap;
pub use strip::{DryRunStrip, RenderError, StripRenderer};
