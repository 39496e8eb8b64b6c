//! # meural-adapter-media-player
//!
//! Exposes every Meural frame of an account as a `media_player` entity.
//!
//! ## How it works
//!
//! Frames are listed through the cloud API during `setup()`. Each frame is
//! then driven through two channels:
//!
//! | Concern | Channel |
//! |---------|---------|
//! | sleep state, galleries, current item, keys, brightness, postcards | local API on the frame |
//! | device settings (duration, shuffle), item metadata, cloud previews | cloud API |
//!
//! A background task polls each frame. A frame that is asleep or
//! unreachable is reported `off` without touching the cloud.
//!
//! ## Services
//!
//! `turn_on`, `turn_off`, `media_play`, `media_pause`, `media_next_track`,
//! `media_previous_track`, `shuffle_set`, `select_source`, `set_brightness`,
//! `reset_brightness`, `toggle_informationcard`, `set_orientation`,
//! `set_device_option`, `synchronize`, `play_media`, `preview_image`,
//! `preview_image_cloud`.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `meural-app` and `meural-domain`, plus
//! `meural-client` for the vendor APIs.

mod commands;
mod config;
mod error;
mod frame;
mod mapping;
mod poller;

pub use commands::{ImageRoute, MediaPlayerCommand, MediaTarget};
pub use config::{MediaPlayerConfig, SleepFallback};
pub use error::MediaPlayerError;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use meural_app::ports::{Integration, IntegrationContext};
use meural_client::CloudClient;
use meural_domain::entity::Entity;
use meural_domain::error::{HubError, NotFoundError};
use meural_domain::id::EntityId;

use crate::frame::Frame;
use crate::poller::FramePoller;

/// Meural integration driving every frame of one account.
pub struct MeuralIntegration {
    cloud: Arc<CloudClient>,
    config: MediaPlayerConfig,
    frames: HashMap<EntityId, Arc<Frame>>,
    poll_handle: Option<JoinHandle<()>>,
}

impl MeuralIntegration {
    #[must_use]
    pub fn new(cloud: Arc<CloudClient>, config: MediaPlayerConfig) -> Self {
        Self {
            cloud,
            config,
            frames: HashMap::new(),
            poll_handle: None,
        }
    }

    /// Entities of the frames set up so far.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.frames.keys().copied().collect()
    }

    /// Poll one frame now and return its entity.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an entity this integration does
    /// not own, and [`HubError::Integration`] when the poll fails.
    pub async fn refresh(&self, entity_id: EntityId) -> Result<Entity, HubError> {
        Ok(self.frame(entity_id)?.poll().await?)
    }

    fn frame(&self, entity_id: EntityId) -> Result<&Arc<Frame>, NotFoundError> {
        self.frames.get(&entity_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: entity_id.to_string(),
        })
    }
}

impl Integration for MeuralIntegration {
    fn name(&self) -> &'static str {
        mapping::INTEGRATION
    }

    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), HubError> {
        let devices = self
            .cloud
            .get_user_devices()
            .await
            .map_err(MediaPlayerError::from)?;
        tracing::info!(count = devices.len(), "Meural frames listed");

        for device in devices {
            let cloud = Arc::clone(&self.cloud);
            let frame = match Frame::new(cloud, device, self.config.sleep_fallback) {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::warn!(%err, "skipping frame");
                    continue;
                }
            };
            tracing::info!(frame = %frame.alias(), "adding Meural frame");

            frame.initialise().await;
            let discovered = frame.discovered().await?;
            ctx.persist_discovered(discovered).await?;
            self.frames.insert(frame.entity_id(), Arc::new(frame));
        }

        tracing::info!(count = self.frames.len(), "Meural setup complete");
        Ok(())
    }

    async fn start_background(
        &mut self,
        ctx: impl IntegrationContext + Clone + 'static,
    ) -> Result<(), HubError> {
        if self.poll_handle.is_some() {
            return Ok(());
        }
        let frames: Vec<_> = self.frames.values().cloned().collect();
        self.poll_handle = Some(FramePoller::start(ctx, frames, self.config.scan_interval()));
        tracing::info!(
            interval_secs = self.config.scan_interval().as_secs(),
            "Meural poll loop started"
        );
        Ok(())
    }

    async fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> Result<Entity, HubError> {
        let frame = self.frame(entity_id)?;
        let command = MediaPlayerCommand::parse(service, data)?;
        Ok(frame.execute(command).await?)
    }

    async fn teardown(&mut self) -> Result<(), HubError> {
        if let Some(handle) = self.poll_handle.take() {
            handle.abort();
            tracing::debug!("Meural poll task aborted");
        }
        self.frames.clear();
        tracing::info!("Meural integration stopped");
        Ok(())
    }
}
