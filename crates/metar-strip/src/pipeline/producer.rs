use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{FrameSender, PipelineError, Producer};
use crate::color::{to_frame, ColorFrame, ColorTable};
use crate::metar::{Severity, WeatherSource, DEFAULT_TIMEOUT};
use crate::schedule::{next_instant, Schedule};
use crate::stations::StationIndexMap;

/// The weather producer: fetch, classify, color, hand off, wait.
///
/// The first refresh runs as soon as the producer starts; later ones follow
/// the schedule. A refresh never fails: without data every configured
/// position shows [`Severity::Unknown`].
pub struct Refresher<S, C> {
    source: S,
    schedule: C,
    stations: Arc<StationIndexMap>,
    colors: ColorTable,
    fetch_timeout: Duration,
}

impl<S: WeatherSource, C: Schedule> Refresher<S, C> {
    /// Fails when the schedule has no future occurrence.
    pub fn new(source: S, schedule: C, stations: Arc<StationIndexMap>) -> Result<Self, PipelineError> {
        next_instant(&schedule, Utc::now())?;
        Ok(Self {
            source,
            schedule,
            stations,
            colors: ColorTable::default(),
            fetch_timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// Zero keeps the default.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.fetch_timeout = timeout;
        }
        self
    }

    /// One fetch + classify + color cycle.
    pub async fn refresh(&self) -> ColorFrame {
        let mut severities: BTreeMap<usize, Severity> = self
            .stations
            .positions()
            .map(|p| (p, Severity::Unknown))
            .collect();

        let ids = self.stations.station_ids();
        let fetch = self.source.fetch(&ids, self.fetch_timeout);
        let observations = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(observations)) => observations,
            Ok(Err(e)) => {
                log::error!("[Producer] Failed refresh: {}", e);
                return to_frame(Some(&self.colors), &severities);
            }
            Err(_) => {
                log::error!(
                    "[Producer] Failed refresh: no response within {:?}",
                    self.fetch_timeout
                );
                return to_frame(Some(&self.colors), &severities);
            }
        };

        for (id, position) in self.stations.iter() {
            match observations.get(id) {
                Some(observation) => {
                    let severity = observation.severity();
                    if let Some(name) = &observation.name {
                        log::debug!("[Producer] {} is {}", id, name);
                    }
                    log::info!(
                        "[Producer] {} (LED {}): {} {}",
                        id,
                        position,
                        severity,
                        observation.raw_text.as_deref().unwrap_or("")
                    );
                    severities.insert(position, severity);
                }
                None => log::warn!("[Producer] No METAR for {} (LED {})", id, position),
            }
        }

        let mut unmapped: Vec<&str> = observations
            .keys()
            .map(String::as_str)
            .filter(|id| self.stations.position(id).is_none())
            .collect();
        unmapped.sort_unstable();
        for id in unmapped {
            log::warn!("[Producer] No LED index for {}", id);
        }

        to_frame(Some(&self.colors), &severities)
    }
}

#[async_trait]
impl<S: WeatherSource, C: Schedule> Producer for Refresher<S, C> {
    async fn run(
        self,
        frames: FrameSender,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<(), PipelineError> {
        log::info!(
            "[Producer] Refreshing {} stations, timeout {:?}",
            self.stations.len(),
            self.fetch_timeout
        );

        loop {
            let frame = tokio::select! {
                _ = shutdown.changed() => break,
                frame = self.refresh() => frame,
            };

            tokio::select! {
                _ = shutdown.changed() => break,
                delivered = frames.handoff(frame) => {
                    if delivered.is_err() {
                        log::info!("[Producer] Consumer gone");
                        break;
                    }
                }
            }

            let now = Utc::now();
            let next = next_instant(&self.schedule, now)?;
            log::info!("[Producer] Next refresh at {}", next);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        log::info!("[Producer] Stopped");
        Ok(())
    }
}
