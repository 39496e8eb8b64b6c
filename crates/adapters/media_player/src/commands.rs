//! Service calls understood by a Meural media player.
//!
//! Service data arrives as loose JSON. [`MediaPlayerCommand::parse`] checks
//! it completely (required fields, ranges, media types) so that a command
//! reaching a frame is always well-formed.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use meural_client::{DeviceOptions, ItemMetadata, MediaId, Orientation};
use meural_domain::error::ValidationError;

const MAX_DURATION_SECS: u32 = 86_400;

/// Content types a frame can display as a postcard.
const FRAME_IMAGE_TYPES: [&str; 3] = ["image/jpg", "image/jpeg", "image/png"];
/// Content types accepted by a cloud preview.
const CLOUD_IMAGE_TYPES: [&str; 4] = ["image/jpg", "image/jpeg", "image/png", "image/gif"];

/// A validated service call.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPlayerCommand {
    TurnOn,
    TurnOff,
    MediaPlay,
    MediaPause,
    MediaNextTrack,
    MediaPreviousTrack,
    ShuffleSet(bool),
    /// Local gallery, by name.
    SelectSource(String),
    SetBrightness(u8),
    ResetBrightness,
    ToggleInformationCard,
    SetOrientation(Orientation),
    SetDeviceOption(DeviceOptions),
    Synchronize,
    PlayMedia(MediaTarget),
}

/// What a `play_media` style call should put on the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaTarget {
    /// An image fetched from `url`.
    Image {
        url: String,
        content_type: String,
        route: ImageRoute,
    },
    /// A gallery, switched on the frame.
    Gallery(MediaId),
    /// A single artwork, by numeric id.
    Item(MediaId),
}

/// Path an image takes to reach the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRoute {
    /// Posted straight to the frame.
    Frame,
    /// Uploaded to the cloud as a temporary item, then previewed.
    Cloud(ItemMetadata),
}

#[derive(Deserialize)]
struct ShuffleData {
    shuffle: bool,
}

#[derive(Deserialize)]
struct SourceData {
    source: String,
}

#[derive(Deserialize)]
struct BrightnessData {
    brightness: i64,
}

#[derive(Deserialize)]
struct OrientationData {
    orientation: String,
}

#[derive(Deserialize)]
struct PlayMediaData {
    media_content_type: String,
    media_content_id: MediaId,
    #[serde(default)]
    use_cloud: bool,
    #[serde(flatten)]
    metadata: ItemMetadata,
}

#[derive(Deserialize)]
struct PreviewData {
    content_url: String,
    content_type: String,
    #[serde(flatten)]
    metadata: ItemMetadata,
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ValidationError> {
    serde_json::from_value(data).map_err(ValidationError::InvalidServiceData)
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<i64, ValidationError> {
    if (0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 0,
            max,
            value,
        })
    }
}

fn brightness(value: i64) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|level| *level <= 100)
        .ok_or(ValidationError::OutOfRange {
            field: "brightness",
            min: 0,
            max: 100,
            value,
        })
}

fn check_option(field: &'static str, value: Option<u32>, max: u32) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_range(field, i64::from(value), i64::from(max)).map(|_| ()),
        None => Ok(()),
    }
}

fn image_type(content_type: &str, accepted: &[&str]) -> Result<String, ValidationError> {
    let lowered = content_type.to_ascii_lowercase();
    if accepted.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(ValidationError::UnsupportedMediaType(content_type.to_string()))
    }
}

impl MediaPlayerCommand {
    /// Parse a service call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedService`] for unknown services,
    /// [`ValidationError::InvalidServiceData`] when `data` does not decode,
    /// and a specific validation error for out-of-range values, unsupported
    /// media types and non-numeric item ids.
    pub fn parse(service: &str, data: Value) -> Result<Self, ValidationError> {
        let command = match service {
            "turn_on" => Self::TurnOn,
            "turn_off" => Self::TurnOff,
            "media_play" => Self::MediaPlay,
            "media_pause" => Self::MediaPause,
            "media_next_track" => Self::MediaNextTrack,
            "media_previous_track" => Self::MediaPreviousTrack,
            "reset_brightness" => Self::ResetBrightness,
            "toggle_informationcard" => Self::ToggleInformationCard,
            "synchronize" => Self::Synchronize,
            "shuffle_set" => Self::ShuffleSet(decode::<ShuffleData>(data)?.shuffle),
            "select_source" => Self::SelectSource(decode::<SourceData>(data)?.source),
            "set_brightness" => {
                Self::SetBrightness(brightness(decode::<BrightnessData>(data)?.brightness)?)
            }
            "set_orientation" => {
                let raw = decode::<OrientationData>(data)?.orientation;
                let orientation = raw.parse::<Orientation>().map_err(|_| {
                    ValidationError::InvalidValue {
                        field: "orientation",
                        value: raw.clone(),
                    }
                })?;
                Self::SetOrientation(orientation)
            }
            "set_device_option" => Self::SetDeviceOption(Self::device_options(data)?),
            "play_media" => Self::PlayMedia(Self::play_media(decode(data)?)?),
            "preview_image" => {
                let PreviewData {
                    content_url,
                    content_type,
                    ..
                } = decode(data)?;
                Self::PlayMedia(MediaTarget::Image {
                    url: content_url,
                    content_type: image_type(&content_type, &FRAME_IMAGE_TYPES)?,
                    route: ImageRoute::Frame,
                })
            }
            "preview_image_cloud" => {
                let PreviewData {
                    content_url,
                    content_type,
                    metadata,
                } = decode(data)?;
                Self::PlayMedia(MediaTarget::Image {
                    url: content_url,
                    content_type: image_type(&content_type, &CLOUD_IMAGE_TYPES)?,
                    route: ImageRoute::Cloud(metadata),
                })
            }
            other => return Err(ValidationError::UnsupportedService(other.to_string())),
        };
        Ok(command)
    }

    fn device_options(data: Value) -> Result<DeviceOptions, ValidationError> {
        let options: DeviceOptions = decode(data)?;
        check_option("alsSensitivity", options.als_sensitivity, 100)?;
        check_option("imageDuration", options.image_duration, MAX_DURATION_SECS)?;
        check_option("previewDuration", options.preview_duration, MAX_DURATION_SECS)?;
        check_option("overlayDuration", options.overlay_duration, MAX_DURATION_SECS)?;
        Ok(options)
    }

    fn play_media(data: PlayMediaData) -> Result<MediaTarget, ValidationError> {
        let PlayMediaData {
            media_content_type,
            media_content_id,
            use_cloud,
            metadata,
        } = data;
        match media_content_type.as_str() {
            "playlist" => Ok(MediaTarget::Gallery(media_content_id)),
            "item" => {
                if media_content_id.as_number().is_some() {
                    Ok(MediaTarget::Item(media_content_id))
                } else {
                    Err(ValidationError::NonNumericMediaId(
                        media_content_id.to_string(),
                    ))
                }
            }
            content_type => {
                let content_type = image_type(content_type, &CLOUD_IMAGE_TYPES)?;
                let route = if use_cloud {
                    ImageRoute::Cloud(metadata)
                } else {
                    ImageRoute::Frame
                };
                Ok(MediaTarget::Image {
                    url: media_content_id.to_string(),
                    content_type,
                    route,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_parse_services_without_data() {
        assert_eq!(
            MediaPlayerCommand::parse("turn_off", Value::Null).unwrap(),
            MediaPlayerCommand::TurnOff
        );
        assert_eq!(
            MediaPlayerCommand::parse("toggle_informationcard", json!({})).unwrap(),
            MediaPlayerCommand::ToggleInformationCard
        );
    }

    #[test]
    fn should_reject_unknown_service() {
        let err = MediaPlayerCommand::parse("volume_up", Value::Null).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedService(s) if s == "volume_up"));
    }

    #[test]
    fn should_reject_missing_service_data() {
        let err = MediaPlayerCommand::parse("select_source", Value::Null).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidServiceData(_)));
    }

    #[test]
    fn should_check_brightness_range() {
        assert_eq!(
            MediaPlayerCommand::parse("set_brightness", json!({ "brightness": 100 })).unwrap(),
            MediaPlayerCommand::SetBrightness(100)
        );
        let err =
            MediaPlayerCommand::parse("set_brightness", json!({ "brightness": 150 })).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "brightness",
                value: 150,
                ..
            }
        ));
        assert!(
            MediaPlayerCommand::parse("set_brightness", json!({ "brightness": -1 })).is_err()
        );
    }

    #[test]
    fn should_parse_orientation() {
        assert_eq!(
            MediaPlayerCommand::parse("set_orientation", json!({ "orientation": "portrait" }))
                .unwrap(),
            MediaPlayerCommand::SetOrientation(Orientation::Portrait)
        );
        let err = MediaPlayerCommand::parse("set_orientation", json!({ "orientation": "upside" }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "orientation", .. }));
    }

    #[test]
    fn should_validate_device_options() {
        let command = MediaPlayerCommand::parse(
            "set_device_option",
            json!({ "imageDuration": 600, "gestureFlip": true }),
        )
        .unwrap();
        let MediaPlayerCommand::SetDeviceOption(options) = command else {
            panic!("expected device options");
        };
        assert_eq!(options.image_duration, Some(600));
        assert_eq!(options.gesture_flip, Some(true));

        let err = MediaPlayerCommand::parse("set_device_option", json!({ "alsSensitivity": 101 }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "alsSensitivity", .. }));

        let err =
            MediaPlayerCommand::parse("set_device_option", json!({ "brightness": 3 })).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidServiceData(_)));
    }

    #[test]
    fn should_route_images_to_frame_unless_cloud_is_requested() {
        let local = MediaPlayerCommand::parse(
            "play_media",
            json!({ "media_content_type": "image/jpg", "media_content_id": "http://x/a.jpg" }),
        )
        .unwrap();
        assert_eq!(
            local,
            MediaPlayerCommand::PlayMedia(MediaTarget::Image {
                url: "http://x/a.jpg".to_string(),
                content_type: "image/jpg".to_string(),
                route: ImageRoute::Frame,
            })
        );

        let cloud = MediaPlayerCommand::parse(
            "play_media",
            json!({
                "media_content_type": "image/gif",
                "media_content_id": "http://x/a.gif",
                "use_cloud": true,
                "name": "Loop",
                "year": 2020
            }),
        )
        .unwrap();
        let MediaPlayerCommand::PlayMedia(MediaTarget::Image {
            route: ImageRoute::Cloud(metadata),
            ..
        }) = cloud
        else {
            panic!("expected cloud image");
        };
        assert_eq!(metadata.name.as_deref(), Some("Loop"));
        assert_eq!(metadata.year.as_deref(), Some("2020"));
    }

    #[test]
    fn should_parse_gallery_and_item_targets() {
        assert_eq!(
            MediaPlayerCommand::parse(
                "play_media",
                json!({ "media_content_type": "playlist", "media_content_id": 154 })
            )
            .unwrap(),
            MediaPlayerCommand::PlayMedia(MediaTarget::Gallery(MediaId::from(154)))
        );
        assert_eq!(
            MediaPlayerCommand::parse(
                "play_media",
                json!({ "media_content_type": "item", "media_content_id": "8812" })
            )
            .unwrap(),
            MediaPlayerCommand::PlayMedia(MediaTarget::Item(MediaId::from(8812)))
        );
    }

    #[test]
    fn should_reject_non_numeric_item_id() {
        let err = MediaPlayerCommand::parse(
            "play_media",
            json!({ "media_content_type": "item", "media_content_id": "sunset" }),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NonNumericMediaId(id) if id == "sunset"));
    }

    #[test]
    fn should_reject_unsupported_media_type() {
        let err = MediaPlayerCommand::parse(
            "play_media",
            json!({ "media_content_type": "video/mp4", "media_content_id": "http://x/a.mp4" }),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedMediaType(t) if t == "video/mp4"));
    }

    #[test]
    fn should_restrict_frame_preview_to_still_images() {
        let err = MediaPlayerCommand::parse(
            "preview_image",
            json!({ "content_url": "http://x/a.gif", "content_type": "image/gif" }),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedMediaType(_)));

        assert!(
            MediaPlayerCommand::parse(
                "preview_image_cloud",
                json!({ "content_url": "http://x/a.gif", "content_type": "image/gif" }),
            )
            .is_ok()
        );
    }
}
