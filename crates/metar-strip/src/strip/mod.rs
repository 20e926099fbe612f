//! LED strip output.
//!
//! The pipeline drives any [`StripRenderer`]. Hardware drivers implement it
//! on top of their PWM/DMA bindings; [`DryRunStrip`] packs frames exactly as
//! a WS281x driver would and logs them instead.

mod buffer;

pub use buffer::{DryRunStrip, StripBuffer};

use async_trait::async_trait;

use crate::color::ColorFrame;

/// Errors from a strip renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("strip initialization failed: {0}")]
    Init(String),
    #[error("render failed: {0}")]
    RenderFailed(String),
}

/// Output capability for one addressable strip.
///
/// `render` returns only once the frame is on the hardware. The consumer
/// owns the renderer and never calls it concurrently.
#[async_trait]
pub trait StripRenderer: Send {
    /// Prepare the hardware. Called once before the first frame.
    async fn init(&mut self) -> Result<(), RenderError>;

    /// Push one frame to the strip.
    async fn render(&mut self, frame: &ColorFrame) -> Result<(), RenderError>;

    /// Release the hardware. Always the last call on a renderer.
    fn shutdown(&mut self);
}
