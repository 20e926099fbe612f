//! The refresh → render pipeline.
//!
//! A [`Producer`] builds frames and hands them one at a time to the render
//! consumer over a single-slot channel. [`supervise`] runs both as one unit
//! sharing a `watch` shutdown channel: a signal, or either side finishing,
//! cancels the other. The consumer always finishes with an all-off frame.

mod consumer;
mod producer;
mod supervisor;

pub use consumer::render_loop;
pub use producer::Refresher;
pub use supervisor::{shutdown_on_signal, supervise};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::color::ColorFrame;
use crate::schedule::ScheduleError;
use crate::strip::RenderError;

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("pipeline task failed: {0}")]
    Task(String),
}

impl From<ScheduleError> for PipelineError {
    fn from(e: ScheduleError) -> Self {
        PipelineError::Configuration(e.to_string())
    }
}

/// The consumer is gone and no more frames can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("frame channel closed")]
pub struct ChannelClosed;

/// Producer side of the frame channel.
#[derive(Debug)]
pub struct FrameSender {
    tx: mpsc::Sender<ColorFrame>,
}

impl FrameSender {
    /// Hand `frame` to the consumer.
    ///
    /// Completes only once the consumer has taken the frame out of the
    /// slot, so a producer never runs more than one frame ahead.
    pub async fn handoff(&self, frame: ColorFrame) -> Result<(), ChannelClosed> {
        self.tx.send(frame).await.map_err(|_| ChannelClosed)?;
        // The only permit frees up when the consumer receives.
        drop(self.tx.reserve().await.map_err(|_| ChannelClosed)?);
        Ok(())
    }
}

/// Consumer side of the frame channel.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: mpsc::Receiver<ColorFrame>,
}

impl FrameReceiver {
    /// Next frame, or `None` once the producer has dropped its sender.
    pub async fn recv(&mut self) -> Option<ColorFrame> {
        self.rx.recv().await
    }

    /// Refuse further frames; a blocked `handoff` fails.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// A single-slot rendezvous channel for frames.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (FrameSender { tx }, FrameReceiver { rx })
}

/// Something that emits frames until shutdown.
///
/// Implementations return after observing `shutdown` or when the consumer
/// is gone. Dropping `frames` on return closes the channel.
#[async_trait]
pub trait Producer: Send + Sized + 'static {
    async fn run(
        self,
        frames: FrameSender,
        shutdown: watch::Receiver<()>,
    ) -> Result<(), PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use std::time::Duration;

    #[tokio::test]
    async fn handoff_waits_for_receive() {
        let (tx, mut rx) = frame_channel();
        let mut handoff = Box::pin(tx.handoff(ColorFrame::filled([0], Rgb::new(0, 255, 0))));

        // Nobody has received yet, the handoff stays pending.
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut handoff)
            .await
            .is_err());

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.get(0), Some(Rgb::new(0, 255, 0)));
        handoff.await.unwrap();
    }

    #[tokio::test]
    async fn handoff_fails_once_receiver_closes() {
        let (tx, mut rx) = frame_channel();
        rx.close();
        assert_eq!(tx.handoff(ColorFrame::new()).await, Err(ChannelClosed));
    }

    #[tokio::test]
    async fn receiver_sees_end_of_stream() {
        let (tx, mut rx) = frame_channel();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
