//! Test helpers for pipeline scenarios

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metar_strip::metar::{index_by_station, FetchError};
use metar_strip::schedule::Schedule;
use metar_strip::{ColorFrame, Observation, RenderError, StationIndexMap, StripRenderer, WeatherSource};

/// Weather source returning canned observations and counting calls.
#[derive(Clone)]
pub struct MockSource {
    observations: Option<Vec<Observation>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn returning(observations: Vec<Observation>) -> Self {
        Self {
            observations: Some(observations),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            observations: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer only after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared counter, usable after the source has moved into a producer.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl WeatherSource for MockSource {
    async fn fetch(
        &self,
        _station_ids: &[String],
        _timeout: Duration,
    ) -> Result<HashMap<String, Observation>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.observations {
            Some(observations) => Ok(index_by_station(observations.clone())),
            None => Err(FetchError::failed("connection refused")),
        }
    }
}

/// What a [`RecordingRenderer`] saw.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub init_calls: usize,
    pub attempts: usize,
    pub frames: Vec<ColorFrame>,
    pub shutdown_calls: usize,
}

/// Renderer that records every successful frame.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
    fail_init: bool,
    fail_renders: usize,
    render_delay: Duration,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Fail the first `n` renders.
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_renders: n,
            ..Self::default()
        }
    }

    /// Take `delay` over every render, like a slow strip.
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub fn frames(&self) -> Vec<ColorFrame> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn attempts(&self) -> usize {
        self.log.lock().unwrap().attempts
    }

    pub fn init_calls(&self) -> usize {
        self.log.lock().unwrap().init_calls
    }

    pub fn shutdown_calls(&self) -> usize {
        self.log.lock().unwrap().shutdown_calls
    }
}

#[async_trait]
impl StripRenderer for RecordingRenderer {
    async fn init(&mut self) -> Result<(), RenderError> {
        self.log.lock().unwrap().init_calls += 1;
        if self.fail_init {
            return Err(RenderError::Init("no device".to_string()));
        }
        Ok(())
    }

    async fn render(&mut self, frame: &ColorFrame) -> Result<(), RenderError> {
        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }
        let mut log = self.log.lock().unwrap();
        log.attempts += 1;
        if self.fail_renders > 0 {
            self.fail_renders -= 1;
            return Err(RenderError::RenderFailed("DMA busy".to_string()));
        }
        log.frames.push(frame.clone());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log.lock().unwrap().shutdown_calls += 1;
    }
}

/// Answers normally `remaining` times, then has no next occurrence.
pub struct StallAfter {
    remaining: AtomicUsize,
    period: Duration,
}

impl StallAfter {
    pub fn new(calls: usize, period: Duration) -> Self {
        Self {
            remaining: AtomicUsize::new(calls),
            period,
        }
    }
}

impl Schedule for StallAfter {
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let left = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match left {
            Ok(_) => after.checked_add_signed(chrono::Duration::from_std(self.period).ok()?),
            Err(_) => None,
        }
    }
}

/// KBOS at 0, KJFK at 1, KSFO at 4.
pub fn stations() -> Arc<StationIndexMap> {
    Arc::new(
        StationIndexMap::new(vec![
            ("KBOS".to_string(), 0),
            ("KJFK".to_string(), 1),
            ("KSFO".to_string(), 4),
        ])
        .unwrap(),
    )
}

/// Poll `condition` every 5ms until it holds or `within` elapses.
pub async fn wait_for(within: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
