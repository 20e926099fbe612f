use tokio::sync::watch;
use tokio::task::JoinError;

use super::{frame_channel, render_loop, PipelineError, Producer};
use crate::color::ColorFrame;
use crate::strip::StripRenderer;

/// Receiver that changes on SIGINT or SIGTERM.
///
/// The receiver exists before the handler is installed, so a signal that
/// arrives before [`supervise`] starts listening is still seen.
pub fn shutdown_on_signal() -> Result<watch::Receiver<()>, ctrlc::Error> {
    let (tx, rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        tx.send_replace(());
    })?;
    Ok(rx)
}

/// Run `producer` and a render consumer as one unit.
///
/// Returns once both have stopped. Whichever finishes first, or a change on
/// `signal`, stops the other. A change that happened before the call counts.
/// The producer's error is reported ahead of the consumer's.
pub async fn supervise<P, R>(
    producer: P,
    renderer: R,
    off_frame: ColorFrame,
    mut signal: watch::Receiver<()>,
) -> Result<(), PipelineError>
where
    P: Producer,
    R: StripRenderer + 'static,
{
    let (frames_tx, frames_rx) = frame_channel();
    let (cancel, _) = watch::channel(());

    let mut producer = tokio::spawn(producer.run(frames_tx, cancel.subscribe()));
    let mut consumer = tokio::spawn(render_loop(
        renderer,
        frames_rx,
        off_frame,
        cancel.subscribe(),
    ));

    let mut producer_done = None;
    let mut consumer_done = None;
    tokio::select! {
        result = &mut producer => {
            log::info!("[Supervisor] Producer finished");
            producer_done = Some(result);
        }
        result = &mut consumer => {
            log::info!("[Supervisor] Consumer finished");
            consumer_done = Some(result);
        }
        // A dropped sender is not a shutdown request.
        Ok(()) = signal.changed() => log::info!("[Supervisor] Shutdown requested"),
    }

    cancel.send_replace(());

    let producer_result = match producer_done {
        Some(result) => result,
        None => producer.await,
    };
    let consumer_result = match consumer_done {
        Some(result) => result,
        None => consumer.await,
    };

    let producer_result = flatten("producer", producer_result);
    let consumer_result = flatten("consumer", consumer_result);
    if let Err(e) = &producer_result {
        log::error!("[Supervisor] Producer failed: {}", e);
    }
    if let Err(e) = &consumer_result {
        log::error!("[Supervisor] Consumer failed: {}", e);
    }
    producer_result.and(consumer_result)
}

fn flatten(
    task: &str,
    result: Result<Result<(), PipelineError>, JoinError>,
) -> Result<(), PipelineError> {
    match result {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(PipelineError::Task(format!("{} panicked", task))),
        Err(e) => Err(PipelineError::Task(format!("{}: {}", task, e))),
    }
}
