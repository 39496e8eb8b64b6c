//! One Meural frame: its clients, its last known state, and the operations
//! that refresh or drive it.
//!
//! State lives behind a per-frame [`Mutex`]. Refreshes hold it for their
//! whole duration so a poll never interleaves with another poll; commands
//! only take it to read a snapshot and to record their effect, so a long
//! cloud preview does not stall polling.

use std::sync::Arc;

use tokio::sync::Mutex;

use meural_app::ports::DiscoveredDevice;
use meural_client::models::{Gallery, GalleryStatus, MediaId};
use meural_client::{CloudClient, DeviceOptions, LocalClient, MeuralError, MeuralDevice};
use meural_domain::entity::Entity;
use meural_domain::error::NotFoundError;
use meural_domain::id::EntityId;

use crate::commands::{ImageRoute, MediaPlayerCommand, MediaTarget};
use crate::config::SleepFallback;
use crate::error::MediaPlayerError;
use crate::mapping::{self, FrameIdentity, FrameState};

/// `imageDuration` applied on play when no duration was stored on pause.
pub(crate) const DEFAULT_PLAY_DURATION: u32 = 1800;

pub(crate) struct Frame {
    cloud: Arc<CloudClient>,
    local: LocalClient,
    identity: FrameIdentity,
    alias: String,
    sleep_fallback: SleepFallback,
    state: Mutex<FrameState>,
}

fn sorted_by_name(mut galleries: Vec<Gallery>) -> Vec<Gallery> {
    galleries.sort_by(|a, b| a.name.cmp(&b.name));
    galleries
}

fn merge_galleries(mut device: Vec<Gallery>, user: Vec<Gallery>) -> Vec<Gallery> {
    for gallery in user {
        if !device.iter().any(|known| known.id == gallery.id) {
            device.push(gallery);
        }
    }
    device
}

impl Frame {
    /// Bind a frame described by the cloud to its LAN address.
    pub fn new(
        cloud: Arc<CloudClient>,
        device: MeuralDevice,
        sleep_fallback: SleepFallback,
    ) -> Result<Self, MeuralError> {
        let local = LocalClient::for_device(cloud.http().clone(), &device, cloud.config())?;
        Ok(Self {
            cloud,
            local,
            identity: FrameIdentity::of(&device),
            alias: device.alias.clone(),
            sleep_fallback,
            state: Mutex::new(FrameState::new(device)),
        })
    }

    pub fn entity_id(&self) -> EntityId {
        self.identity.entity_id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    fn device_id(state: &FrameState) -> u64 {
        state.device.id
    }

    /// Load everything the entity needs. A failure marks the frame aborted
    /// instead of being returned.
    pub async fn initialise(&self) {
        let mut state = self.state.lock().await;
        if let Err(err) = self.load(&mut state).await {
            tracing::error!(frame = %self.alias, %err, "setup failed, frame will not be polled");
            state.aborted = true;
            return;
        }
        state.asleep = self.read_sleep().await.unwrap_or(true);
        tracing::info!(frame = %self.alias, "setup completed");
    }

    async fn load(&self, state: &mut FrameState) -> Result<(), MediaPlayerError> {
        let device_id = Self::device_id(state);

        tracing::info!(frame = %self.alias, "fetching device from Meural cloud");
        state.device = self.cloud.get_device(device_id).await?;
        state.pause_duration = state.device.image_duration;

        state.galleries = sorted_by_name(self.local.get_galleries().await?);
        tracing::info!(frame = %self.alias, count = state.galleries.len(), "loaded local galleries");

        let device_galleries = self.cloud.get_device_galleries(device_id).await?;
        let user_galleries = self.cloud.get_user_galleries().await?;
        state.remote_galleries = merge_galleries(device_galleries, user_galleries);
        tracing::info!(frame = %self.alias, count = state.remote_galleries.len(), "loaded remote galleries");

        let status = self.local.get_gallery_status().await?;
        state.current_item = None;
        if status.is_sd_card_gallery() {
            tracing::info!(frame = %self.alias, gallery = %status.current_gallery, "SD-card gallery, no item information");
        } else {
            self.refresh_item(state, &status).await;
        }
        state.gallery_status = Some(status);
        Ok(())
    }

    /// Current item from the cloud; a failure leaves the item unset.
    async fn refresh_item(&self, state: &mut FrameState, status: &GalleryStatus) {
        state.current_item = match self.cloud.get_item(&status.current_item).await {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(frame = %self.alias, item = %status.current_item, %err, "failed to fetch current item, clearing item information");
                None
            }
        };
    }

    /// Sleep state with the configured fallback applied.
    async fn read_sleep(&self) -> Result<bool, MediaPlayerError> {
        match self.local.get_sleep().await {
            Ok(asleep) => Ok(asleep),
            Err(err) if err.is_device_off() => {
                tracing::debug!(frame = %self.alias, "frame unreachable, treating as asleep");
                Ok(true)
            }
            Err(err) => match self.sleep_fallback {
                SleepFallback::AssumeAsleep => {
                    tracing::warn!(frame = %self.alias, %err, "sleep check failed, treating as asleep");
                    Ok(true)
                }
                SleepFallback::UnreachableOnly => Err(err.into()),
            },
        }
    }

    /// Refresh the frame and return the resulting entity.
    ///
    /// An aborted frame is not contacted. The cloud and the frame's gallery
    /// state are only queried while the frame is awake.
    pub async fn poll(&self) -> Result<Entity, MediaPlayerError> {
        let mut state = self.state.lock().await;
        if state.aborted {
            tracing::debug!(frame = %self.alias, "setup was aborted, skipping poll");
            return Ok(mapping::build_entity(&self.identity, &state)?);
        }

        state.asleep = self.read_sleep().await?;
        if !state.asleep {
            self.refresh_awake(&mut state).await?;
        }
        Ok(mapping::build_entity(&self.identity, &state)?)
    }

    async fn refresh_awake(&self, state: &mut FrameState) -> Result<(), MediaPlayerError> {
        state.galleries = sorted_by_name(self.local.get_galleries().await?);

        let old_orientation = state.device.orientation.clone();
        state.device = self.cloud.get_device(Self::device_id(state)).await?;

        let old_item = state.gallery_status.as_ref().map(|s| s.current_item.clone());
        let status = self.local.get_gallery_status().await?;

        if status.is_sd_card_gallery() {
            tracing::debug!(frame = %self.alias, gallery = %status.current_gallery, "SD-card gallery, clearing item information");
            state.current_item = None;
        } else if old_item.as_ref() != Some(&status.current_item) {
            tracing::info!(frame = %self.alias, item = %status.current_item, "item changed");
            self.refresh_item(state, &status).await;
        } else if old_orientation != state.device.orientation {
            // with orientationMatch the reported item lags behind a rotation
            tracing::info!(frame = %self.alias, "orientation changed, reloading gallery");
            self.local.change_gallery(&status.current_gallery).await?;
        }
        state.gallery_status = Some(status);
        Ok(())
    }

    /// Device and entity as they should be persisted right now.
    pub async fn discovered(&self) -> Result<DiscoveredDevice, MediaPlayerError> {
        let state = self.state.lock().await;
        Ok(mapping::build_discovered(
            &self.identity,
            &state,
            &self.local.base_url(),
        )?)
    }

    pub async fn snapshot(&self) -> Result<Entity, MediaPlayerError> {
        let state = self.state.lock().await;
        Ok(mapping::build_entity(&self.identity, &state)?)
    }

    /// Run a validated command and return the updated entity.
    #[tracing::instrument(skip(self), fields(frame = %self.alias))]
    pub async fn execute(&self, command: MediaPlayerCommand) -> Result<Entity, MediaPlayerError> {
        let view = self.state.lock().await.clone();
        if view.aborted {
            return Err(MediaPlayerError::Aborted {
                alias: self.alias.clone(),
            });
        }
        let device_id = Self::device_id(&view);

        match command {
            MediaPlayerCommand::TurnOn => {
                self.local.resume().await?;
                self.state.lock().await.asleep = false;
            }
            MediaPlayerCommand::TurnOff => {
                self.local.suspend().await?;
                self.state.lock().await.asleep = true;
            }
            MediaPlayerCommand::MediaPlay => {
                let duration = if view.pause_duration == 0 {
                    DEFAULT_PLAY_DURATION
                } else {
                    view.pause_duration
                };
                tracing::info!(duration, "resuming playback");
                self.cloud
                    .update_device(device_id, &DeviceOptions::image_duration(duration))
                    .await?;
                self.state.lock().await.device.image_duration = duration;
            }
            MediaPlayerCommand::MediaPause => {
                tracing::info!("pausing playback");
                self.cloud
                    .update_device(device_id, &DeviceOptions::image_duration(0))
                    .await?;
                let mut state = self.state.lock().await;
                state.pause_duration = view.device.image_duration;
                state.device.image_duration = 0;
            }
            MediaPlayerCommand::MediaNextTrack => {
                if view.device.gesture_flip {
                    self.local.key_left().await?;
                } else {
                    self.local.key_right().await?;
                }
            }
            MediaPlayerCommand::MediaPreviousTrack => {
                if view.device.gesture_flip {
                    self.local.key_right().await?;
                } else {
                    self.local.key_left().await?;
                }
            }
            MediaPlayerCommand::ShuffleSet(shuffle) => {
                self.cloud
                    .update_device(device_id, &DeviceOptions::image_shuffle(shuffle))
                    .await?;
                self.state.lock().await.device.image_shuffle = shuffle;
            }
            MediaPlayerCommand::SelectSource(name) => {
                let gallery = view
                    .galleries
                    .iter()
                    .find(|g| g.name == name)
                    .ok_or_else(|| NotFoundError {
                        entity: "Source",
                        id: name.clone(),
                    })?;
                self.local.change_gallery(&gallery.id).await?;
            }
            MediaPlayerCommand::SetBrightness(level) => {
                self.local.set_backlight(level).await?;
            }
            MediaPlayerCommand::ResetBrightness => {
                self.local.als_calibrate_off().await?;
            }
            MediaPlayerCommand::ToggleInformationCard => {
                self.local.key_up().await?;
            }
            MediaPlayerCommand::SetOrientation(orientation) => {
                self.local.set_orientation(orientation).await?;
            }
            MediaPlayerCommand::SetDeviceOption(options) => {
                tracing::info!("updating device options");
                self.cloud.update_device(device_id, &options).await?;
            }
            MediaPlayerCommand::Synchronize => {
                tracing::info!("synchronizing with Meural cloud");
                self.cloud.sync_device(device_id).await?;
            }
            MediaPlayerCommand::PlayMedia(target) => {
                self.play_media(&view, target).await?;
            }
        }

        self.snapshot().await
    }

    async fn play_media(
        &self,
        view: &FrameState,
        target: MediaTarget,
    ) -> Result<(), MediaPlayerError> {
        match target {
            MediaTarget::Image {
                url,
                content_type,
                route: ImageRoute::Frame,
            } => {
                tracing::info!(%url, %content_type, "previewing image on frame");
                // a refused postcard is logged by the client
                self.local.send_postcard(&url, &content_type).await?;
            }
            MediaTarget::Image {
                url,
                content_type,
                route: ImageRoute::Cloud(metadata),
            } => {
                tracing::info!(%url, %content_type, "previewing image via Meural cloud");
                self.cloud
                    .send_postcard_cloud(Self::device_id(view), &url, &content_type, &metadata)
                    .await?;
            }
            MediaTarget::Gallery(gallery_id) => {
                tracing::info!(gallery = %gallery_id, "playing gallery");
                self.local.change_gallery(&gallery_id).await?;
            }
            MediaTarget::Item(item_id) => self.play_item(view, &item_id).await?,
        }
        Ok(())
    }

    /// Play locally when the item is in the current gallery, otherwise ask
    /// the cloud to load it.
    async fn play_item(
        &self,
        view: &FrameState,
        item_id: &MediaId,
    ) -> Result<(), MediaPlayerError> {
        let status = match &view.gallery_status {
            Some(status) => status.clone(),
            None => self.local.get_gallery_status().await?,
        };
        let items = self.local.get_items_by_gallery(&status.current_gallery).await?;

        if items.iter().any(|item| &item.id == item_id) {
            tracing::info!(item = %item_id, gallery = %status.current_gallery_name, "item is in current gallery, playing locally");
            self.local.change_item(item_id).await?;
        } else {
            tracing::info!(item = %item_id, "item is not in current gallery, loading via Meural cloud");
            if let Err(err) = self
                .cloud
                .device_load_item(Self::device_id(view), item_id)
                .await
            {
                tracing::error!(item = %item_id, %err, "failed to load item via Meural cloud");
            }
        }
        Ok(())
    }
}
