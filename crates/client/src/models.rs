//! Typed views over the JSON payloads of the cloud and local APIs.
//!
//! The vendor is loose with types: ids come back as numbers from the cloud
//! and as strings from the frame, years may be either. Those fields go
//! through [`MediaId`] or the lenient string deserializer below.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number-or-string identifier of a gallery or item.
///
/// Stored as its decimal/text form so that `12` from the cloud and `"12"`
/// from the frame compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    /// Borrow the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, when the id is all digits.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for MediaId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for MediaId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NumberOrString::deserialize(deserializer).map(|raw| Self(raw.into_string()))
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_string))
}

/// A frame as described by the cloud (`user/devices`, `devices/{id}`).
///
/// Fields the hub does not interpret are kept in [`extra`](Self::extra).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeuralDevice {
    pub id: u64,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub local_ip: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub product_key: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub frame_model: Option<FrameModel>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub image_duration: u32,
    #[serde(default)]
    pub image_shuffle: bool,
    #[serde(default)]
    pub gesture_flip: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MeuralDevice {
    /// The cloud reports the frame as offline.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.status.as_deref() == Some("offline")
    }
}

/// Hardware model of a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameModel {
    pub name: String,
}

/// A gallery (playlist), either local to the frame or stored in the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: MediaId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cover: Option<String>,
}

/// An artwork stored in the cloud.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Option<MediaId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
}

/// What the frame is currently showing (`get_gallery_status_json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryStatus {
    pub current_gallery: MediaId,
    #[serde(default)]
    pub current_gallery_name: String,
    pub current_item: MediaId,
}

impl GalleryStatus {
    /// Galleries `1` to `4` are the SD-card folders; their items are not
    /// known to the cloud.
    #[must_use]
    pub fn is_sd_card_gallery(&self) -> bool {
        self.current_gallery.as_number().is_some_and(|id| id <= 4)
    }
}

/// An item of a gallery as listed by the frame itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameItem {
    pub id: MediaId,
    #[serde(default)]
    pub title: Option<String>,
}

/// Acknowledgement of a postcard upload by the frame.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadAck {
    pub status: String,
    #[serde(default)]
    pub response: Value,
}

/// Result of a postcard upload the frame accepted at the HTTP level.
///
/// A rejection is not an error: the bytes were delivered, the frame just
/// refused to display them. Callers decide whether that matters.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The frame reported `status: pass`.
    Accepted,
    /// The frame reported any other status; `response` is its explanation.
    Rejected { status: String, response: Value },
}

impl UploadOutcome {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Device settings accepted by `PUT devices/{id}`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub als_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub als_sensitivity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goes_dark: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_shuffle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture_feedback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture_feedback_help: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture_flip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_rotation: Option<bool>,
}

impl DeviceOptions {
    /// Only `imageDuration` set.
    #[must_use]
    pub fn image_duration(seconds: u32) -> Self {
        Self {
            image_duration: Some(seconds),
            ..Self::default()
        }
    }

    /// Only `imageShuffle` set.
    #[must_use]
    pub fn image_shuffle(shuffle: bool) -> Self {
        Self {
            image_shuffle: Some(shuffle),
            ..Self::default()
        }
    }
}

/// Caller-supplied metadata of an item uploaded for a cloud preview.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
}

/// Body of `PUT items/{id}` with every field filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ItemPatch {
    pub name: String,
    pub author: String,
    pub description: String,
    pub medium: String,
    pub year: String,
}

impl ItemMetadata {
    pub(crate) fn to_patch(&self) -> ItemPatch {
        ItemPatch {
            name: self.name.clone().unwrap_or_else(|| "Preview".to_string()),
            author: self.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            description: self.description.clone().unwrap_or_default(),
            medium: self.medium.clone().unwrap_or_else(|| "Digital".to_string()),
            year: self.year.clone().unwrap_or_default(),
        }
    }
}
