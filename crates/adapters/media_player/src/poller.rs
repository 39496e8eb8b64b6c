//! Background poller — refreshes every frame and persists the snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use meural_app::ports::IntegrationContext;

use crate::frame::Frame;

/// Polls each frame once per interval, one frame after the other.
///
/// A failing frame is logged and retried on the next tick; it never stops
/// the loop or the other frames.
pub(crate) struct FramePoller<C> {
    context: C,
    frames: Vec<Arc<Frame>>,
    interval: Duration,
}

impl<C: IntegrationContext + Clone + 'static> FramePoller<C> {
    pub fn start(context: C, frames: Vec<Arc<Frame>>, interval: Duration) -> JoinHandle<()> {
        let poller = Self {
            context,
            frames,
            interval,
        };

        tokio::spawn(poller.run())
    }

    async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            self.iterate().await;
        }
    }

    async fn iterate(&self) {
        for frame in &self.frames {
            match frame.poll().await {
                Ok(entity) => {
                    if let Err(err) = self.context.upsert_entity(entity).await {
                        tracing::warn!(frame = %frame.alias(), %err, "failed to persist frame state");
                    }
                }
                Err(err) => {
                    tracing::warn!(frame = %frame.alias(), %err, "frame poll failed, retrying next interval");
                }
            }
        }
    }
}
