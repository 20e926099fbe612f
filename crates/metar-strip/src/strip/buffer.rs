use async_trait::async_trait;

use super::{RenderError, StripRenderer};
use crate::color::{ColorFrame, Rgb};

/// Packed `0x00RRGGBB` words for a fixed-length strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripBuffer {
    brightness: u8,
    words: Vec<u32>,
}

impl StripBuffer {
    pub fn new(led_count: usize, brightness: u8) -> Self {
        Self {
            brightness,
            words: vec![0; led_count],
        }
    }

    pub fn led_count(&self) -> usize {
        self.words.len()
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Replace the whole buffer with `frame`.
    ///
    /// Positions missing from the frame go dark. Positions past the end of
    /// the strip are dropped; the number dropped is returned.
    pub fn load(&mut self, frame: &ColorFrame) -> usize {
        self.words.fill(0);
        let mut dropped = 0;
        for (position, color) in frame.iter() {
            match self.words.get_mut(position) {
                Some(word) => *word = color.scaled(self.brightness).to_u32(),
                None => {
                    log::warn!(
                        "[Strip] position {} is outside a {}-LED strip, ignoring",
                        position,
                        self.words.len()
                    );
                    dropped += 1;
                }
            }
        }
        dropped
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of LEDs that are not dark.
    pub fn lit(&self) -> usize {
        self.words.iter().filter(|w| **w != Rgb::OFF.to_u32()).count()
    }
}

/// Renderer that packs frames and logs them instead of driving hardware.
#[derive(Debug)]
pub struct DryRunStrip {
    buffer: StripBuffer,
    gpio_pin: u8,
    initialized: bool,
    frames: u64,
}

impl DryRunStrip {
    pub fn new(led_count: usize, brightness: u8, gpio_pin: u8) -> Self {
        Self {
            buffer: StripBuffer::new(led_count, brightness),
            gpio_pin,
            initialized: false,
            frames: 0,
        }
    }

    pub fn buffer(&self) -> &StripBuffer {
        &self.buffer
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[async_trait]
impl StripRenderer for DryRunStrip {
    async fn init(&mut self) -> Result<(), RenderError> {
        if self.buffer.led_count() == 0 {
            return Err(RenderError::Init("strip has no LEDs".to_string()));
        }
        log::info!(
            "[Strip] dry run: {} LEDs on GPIO {}, brightness {}",
            self.buffer.led_count(),
            self.gpio_pin,
            self.buffer.brightness()
        );
        self.initialized = true;
        Ok(())
    }

    async fn render(&mut self, frame: &ColorFrame) -> Result<(), RenderError> {
        if !self.initialized {
            return Err(RenderError::RenderFailed(
                "strip not initialized".to_string(),
            ));
        }
        self.buffer.load(frame);
        self.frames += 1;
        log::info!(
            "[Strip] frame {}: {} of {} LEDs lit",
            self.frames,
            self.buffer.lit(),
            self.buffer.led_count()
        );
        if log::log_enabled!(log::Level::Debug) {
            for (position, color) in frame.iter() {
                log::debug!("[Strip]   {:>4} {}", position, color);
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.initialized {
            log::info!("[Strip] released after {} frames", self.frames);
        }
        self.initialized = false;
    }
}
