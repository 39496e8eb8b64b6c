//! Mapping of frame state onto hub devices and `media_player` entities.

use meural_app::ports::DiscoveredDevice;
use meural_client::models::{Gallery, GalleryStatus, Item, MeuralDevice};
use meural_domain::device::Device;
use meural_domain::entity::{AttributeValue, Entity, EntityState};
use meural_domain::error::HubError;
use meural_domain::id::{DeviceId, EntityId};

pub(crate) const INTEGRATION: &str = "meural";
const MANUFACTURER: &str = "NETGEAR";

/// Everything known about one frame at a point in time.
#[derive(Debug, Clone)]
pub(crate) struct FrameState {
    pub device: MeuralDevice,
    /// Local galleries, sorted by name.
    pub galleries: Vec<Gallery>,
    /// Device galleries followed by user galleries, without duplicates.
    pub remote_galleries: Vec<Gallery>,
    pub gallery_status: Option<GalleryStatus>,
    pub current_item: Option<Item>,
    /// `imageDuration` to restore on play.
    pub pause_duration: u32,
    pub asleep: bool,
    pub aborted: bool,
}

impl FrameState {
    pub fn new(device: MeuralDevice) -> Self {
        Self {
            pause_duration: device.image_duration,
            device,
            galleries: Vec::new(),
            remote_galleries: Vec::new(),
            gallery_status: None,
            current_item: None,
            asleep: true,
            aborted: false,
        }
    }

    pub fn entity_state(&self) -> EntityState {
        if self.aborted || self.device.is_offline() {
            EntityState::Unavailable
        } else if self.asleep {
            EntityState::Off
        } else if self.device.image_duration == 0 {
            EntityState::Paused
        } else {
            EntityState::Playing
        }
    }
}

/// Stable identifiers of a frame, fixed when the frame is first seen.
#[derive(Debug, Clone)]
pub(crate) struct FrameIdentity {
    pub unique_id: String,
    pub device_id: DeviceId,
    pub entity_id: EntityId,
    /// `media_player.<slug>`.
    pub object_id: String,
}

impl FrameIdentity {
    pub fn of(device: &MeuralDevice) -> Self {
        let unique_id = device
            .product_key
            .clone()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| device.id.to_string());
        let slug = slugify(&device.alias);
        let slug = if slug.is_empty() {
            format!("meural_{}", device.id)
        } else {
            slug
        };
        Self {
            device_id: DeviceId::stable(INTEGRATION, &unique_id),
            entity_id: EntityId::stable(INTEGRATION, &unique_id),
            object_id: format!("media_player.{slug}"),
            unique_id,
        }
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

fn display_name(device: &MeuralDevice) -> String {
    if device.alias.trim().is_empty() {
        format!("Meural {}", device.id)
    } else {
        device.alias.clone()
    }
}

/// `artist, year`, falling back to the author and then to `Unknown, year`.
pub(crate) fn media_artist(item: &Item) -> Option<String> {
    let who = item.artist_name.as_deref().or(item.author.as_deref());
    match (who, item.year.as_deref()) {
        (Some(who), Some(year)) => Some(format!("{who}, {year}")),
        (Some(who), None) => Some(who.to_string()),
        (None, Some(year)) => Some(format!("Unknown, {year}")),
        (None, None) => None,
    }
}

fn text(value: Option<&str>) -> Option<AttributeValue> {
    value.map(|v| AttributeValue::String(v.to_string()))
}

pub(crate) fn build_entity(
    identity: &FrameIdentity,
    state: &FrameState,
) -> Result<Entity, HubError> {
    let item = state.current_item.as_ref();
    let status = state.gallery_status.as_ref();
    Entity::builder()
        .id(identity.entity_id)
        .device_id(identity.device_id)
        .entity_id(&identity.object_id)
        .friendly_name(display_name(&state.device))
        .state(state.entity_state())
        .attribute("media_content_type", AttributeValue::String("image".to_string()))
        .attribute(
            "source_list",
            AttributeValue::string_list(state.galleries.iter().map(|g| g.name.as_str())),
        )
        .attribute("shuffle", AttributeValue::Bool(state.device.image_shuffle))
        .attribute(
            "image_duration",
            AttributeValue::Int(i64::from(state.device.image_duration)),
        )
        .maybe_attribute("source", text(status.map(|s| s.current_gallery_name.as_str())))
        .maybe_attribute(
            "media_content_id",
            text(status.map(|s| s.current_item.as_str())),
        )
        .maybe_attribute("media_title", text(item.and_then(|i| i.name.as_deref())))
        .maybe_attribute(
            "media_summary",
            text(item.and_then(|i| i.description.as_deref())),
        )
        .maybe_attribute(
            "media_artist",
            item.and_then(media_artist).map(AttributeValue::String),
        )
        .maybe_attribute("media_image_url", text(item.and_then(|i| i.image.as_deref())))
        .maybe_attribute("local_ip", text(state.device.local_ip.as_deref()))
        .maybe_attribute("orientation", text(state.device.orientation.as_deref()))
        .build()
}

pub(crate) fn build_discovered(
    identity: &FrameIdentity,
    state: &FrameState,
    configuration_url: &str,
) -> Result<DiscoveredDevice, HubError> {
    let mut device = Device::builder()
        .id(identity.device_id)
        .name(display_name(&state.device))
        .integration(INTEGRATION)
        .unique_id(&identity.unique_id)
        .manufacturer(MANUFACTURER)
        .configuration_url(configuration_url);
    if let Some(model) = &state.device.frame_model {
        device = device.model(&model.name);
    }
    if let Some(version) = &state.device.version {
        device = device.sw_version(version);
    }

    Ok(DiscoveredDevice {
        device: device.build()?,
        entities: vec![build_entity(identity, state)?],
    })
}
