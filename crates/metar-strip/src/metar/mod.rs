//! METAR observations: decoding, flight category classification and the
//! Aviation Weather Center client.

mod classify;
mod client;
mod observation;

pub use classify::{classify, Severity};
pub use client::{
    index_by_station, FetchError, MetarClient, WeatherSource, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
pub use observation::{CloudCover, CloudLayer, Observation, ParseVisibilityError, Visibility};
