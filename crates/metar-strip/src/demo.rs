//! Producers for checking the strip without weather data.

use async_trait::async_trait;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::color::{to_frame, ColorFrame, ColorTable, Rgb};
use crate::metar::Severity;
use crate::pipeline::{FrameSender, PipelineError, Producer};

/// Frame period used by the `test` and `identify` commands.
pub const DEMO_PERIOD: Duration = Duration::from_secs(1);

/// Frame period used by the `rand` command.
pub const RANDOM_PERIOD: Duration = Duration::from_secs(5);

async fn tick_frames(
    frames: FrameSender,
    mut shutdown: watch::Receiver<()>,
    period: Duration,
    mut next_frame: impl FnMut() -> ColorFrame + Send,
) -> Result<(), PipelineError> {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let frame = next_frame();
        tokio::select! {
            _ = shutdown.changed() => break,
            delivered = frames.handoff(frame) => {
                if delivered.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Walks every LED through unknown → VFR → MVFR → IFR → LIFR, staggered
/// so neighbours show different categories.
#[derive(Debug, Clone)]
pub struct CycleProducer {
    severities: BTreeMap<usize, Severity>,
    colors: ColorTable,
    period: Duration,
}

impl CycleProducer {
    pub fn new(led_count: usize) -> Self {
        let mut severity = Severity::Unknown;
        let severities = (0..led_count)
            .map(|position| {
                let current = severity;
                severity = severity.cycle_next();
                (position, current)
            })
            .collect();
        Self {
            severities,
            colors: ColorTable::default(),
            period: DEMO_PERIOD,
        }
    }

    pub fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// The frame for the current step, then advance every LED.
    pub fn step(&mut self) -> ColorFrame {
        let frame = to_frame(Some(&self.colors), &self.severities);
        for severity in self.severities.values_mut() {
            *severity = severity.cycle_next();
        }
        frame
    }
}

#[async_trait]
impl Producer for CycleProducer {
    async fn run(
        mut self,
        frames: FrameSender,
        shutdown: watch::Receiver<()>,
    ) -> Result<(), PipelineError> {
        log::info!(
            "[Demo] Cycling {} LEDs every {:?}",
            self.severities.len(),
            self.period
        );
        let period = self.period;
        tick_frames(frames, shutdown, period, move || self.step()).await
    }
}

/// Blinks one LED on and off.
#[derive(Debug, Clone)]
pub struct FlashProducer {
    position: usize,
    color: Rgb,
    lit: bool,
    period: Duration,
}

impl FlashProducer {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            color: Rgb::new(0, 255, 0),
            lit: false,
            period: DEMO_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Toggle the LED and return the resulting frame.
    pub fn step(&mut self) -> ColorFrame {
        self.lit = !self.lit;
        let color = if self.lit { self.color } else { Rgb::OFF };
        ColorFrame::filled([self.position], color)
    }
}

#[async_trait]
impl Producer for FlashProducer {
    async fn run(
        mut self,
        frames: FrameSender,
        shutdown: watch::Receiver<()>,
    ) -> Result<(), PipelineError> {
        log::info!("[Demo] Flashing LED {}", self.position);
        let period = self.period;
        tick_frames(frames, shutdown, period, move || self.step()).await
    }
}

/// Paints the whole strip one random color, then picks a new one.
#[derive(Debug, Clone)]
pub struct RandomProducer {
    led_count: usize,
    period: Duration,
}

impl RandomProducer {
    pub fn new(led_count: usize) -> Self {
        Self {
            led_count,
            period: RANDOM_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Every LED set to one freshly drawn color.
    pub fn step(&mut self) -> ColorFrame {
        let mut rng = rand::rng();
        let color = Rgb::new(rng.random(), rng.random(), rng.random());
        log::info!("[Demo] Rendering {}", color);
        ColorFrame::filled(0..self.led_count, color)
    }
}

#[async_trait]
impl Producer for RandomProducer {
    async fn run(
        mut self,
        frames: FrameSender,
        shutdown: watch::Receiver<()>,
    ) -> Result<(), PipelineError> {
        log::info!(
            "[Demo] Random colors on {} LEDs every {:?}",
            self.led_count,
            self.period
        );
        let period = self.period;
        tick_frames(frames, shutdown, period, move || self.step()).await
    }
}
