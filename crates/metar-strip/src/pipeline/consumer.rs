use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;

use super::{FrameReceiver, PipelineError};
use crate::color::ColorFrame;
use crate::strip::StripRenderer;

/// Render frames until the producer closes the channel or shutdown fires.
///
/// A failed render is logged and the loop moves on to the next frame. On
/// the way out, even when a render panicked, `off_frame` is written and the
/// renderer is shut down; a panic is then resumed. `shutdown()` runs even
/// if the off write itself panics.
pub async fn render_loop<R: StripRenderer>(
    mut renderer: R,
    mut frames: FrameReceiver,
    off_frame: ColorFrame,
    mut shutdown: watch::Receiver<()>,
) -> Result<(), PipelineError> {
    if let Err(e) = renderer.init().await {
        log::error!("[Consumer] Failed to initialize strip: {}", e);
        renderer.shutdown();
        return Err(e.into());
    }

    let drained = AssertUnwindSafe(drain(&mut renderer, &mut frames, &mut shutdown))
        .catch_unwind()
        .await;

    frames.close();
    log::info!("[Consumer] Turning strip off");
    let turned_off = AssertUnwindSafe(renderer.render(&off_frame))
        .catch_unwind()
        .await;
    if let Ok(Err(e)) = &turned_off {
        log::error!("[Consumer] Failed to turn strip off: {}", e);
    }
    renderer.shutdown();

    // The loop's panic wins over one from the off write.
    let rendered = match drained {
        Ok(rendered) => rendered,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    if let Err(panic) = turned_off {
        std::panic::resume_unwind(panic);
    }
    log::info!("[Consumer] Stopped after {} frames", rendered);
    Ok(())
}

async fn drain<R: StripRenderer>(
    renderer: &mut R,
    frames: &mut FrameReceiver,
    shutdown: &mut watch::Receiver<()>,
) -> u64 {
    let mut rendered = 0;
    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        match renderer.render(&frame).await {
            Ok(()) => rendered += 1,
            Err(e) => log::error!("[Consumer] Failed to render frame: {}", e),
        }
    }
    rendered
}
