//! Local remote-control client for a single frame.
//!
//! The frame serves an unauthenticated API at `http://<ip>/remote/`. Replies
//! are wrapped in `{"response": ...}` and are sometimes served with a wrong
//! content-type, so bodies are parsed as JSON regardless of the header.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::MeuralError;
use crate::media::{self, normalize_content_type};
use crate::models::{
    FrameItem, Gallery, GalleryStatus, MediaId, MeuralDevice, UploadAck, UploadOutcome,
};

/// Display orientation of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown orientation.
#[derive(Debug, thiserror::Error)]
#[error("unknown orientation {0:?}")]
pub struct UnknownOrientation(String);

impl FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(UnknownOrientation(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    response: Value,
}

/// Client bound to one frame's LAN address.
#[derive(Debug, Clone)]
pub struct LocalClient {
    http: reqwest::Client,
    base: String,
    alias: String,
    timeout: Duration,
}

impl LocalClient {
    /// Client for the frame at `address` (`ip` or `ip:port`).
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        address: &str,
        alias: impl Into<String>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            http,
            base: format!("http://{address}/remote"),
            alias: alias.into(),
            timeout: config.timeout(),
        }
    }

    /// Client for the frame described by `device`.
    ///
    /// # Errors
    ///
    /// Returns [`MeuralError::NoLocalAddress`] when the descriptor has no
    /// `localIp`.
    pub fn for_device(
        http: reqwest::Client,
        device: &MeuralDevice,
        config: &ClientConfig,
    ) -> Result<Self, MeuralError> {
        let address = device
            .local_ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| MeuralError::NoLocalAddress {
                alias: device.alias.clone(),
            })?;
        Ok(Self::new(http, address, device.alias.clone(), config))
    }

    /// Base URL of the frame's remote API, suitable as a configuration link.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/", self.base)
    }

    /// Call `path` under `/remote/` and return the envelope's `response`.
    ///
    /// For `GET`, `data` is sent as query parameters; otherwise as a form.
    ///
    /// # Errors
    ///
    /// Returns [`MeuralError::DeviceTurnedOff`] when no connection can be
    /// established, [`MeuralError::Http`] for any other transport or status
    /// error, and [`MeuralError::Decode`] when the body is not JSON.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&Value>,
    ) -> Result<Value, MeuralError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        let mut builder = self
            .http
            .request(method.clone(), url)
            .timeout(self.timeout);
        if let Some(data) = data {
            builder = if method == Method::GET {
                builder.query(data)
            } else {
                builder.form(data)
            };
        }

        let response = builder
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()?;
        let body = response.bytes().await?;
        let envelope: ResponseEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.response)
    }

    async fn get(&self, path: &str) -> Result<Value, MeuralError> {
        self.request(Method::GET, path, None).await
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, MeuralError> {
        Ok(serde_json::from_value(self.get(path).await?)?)
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn key_left(&self) -> Result<Value, MeuralError> {
        self.get("control_command/set_key/left/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn key_right(&self) -> Result<Value, MeuralError> {
        self.get("control_command/set_key/right/").await
    }

    /// Also toggles the information card.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn key_up(&self) -> Result<Value, MeuralError> {
        self.get("control_command/set_key/up/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn key_down(&self) -> Result<Value, MeuralError> {
        self.get("control_command/set_key/down/").await
    }

    /// Put the display to sleep.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn suspend(&self) -> Result<Value, MeuralError> {
        self.get("control_command/suspend").await
    }

    /// Wake the display.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn resume(&self) -> Result<Value, MeuralError> {
        self.get("control_command/resume").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn set_backlight(&self, level: u8) -> Result<Value, MeuralError> {
        self.get(&format!("control_command/set_backlight/{level}/"))
            .await
    }

    /// Hand brightness back to the ambient light sensor.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn als_calibrate_off(&self) -> Result<Value, MeuralError> {
        self.get("control_command/als_calibrate/off/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn set_orientation(&self, orientation: Orientation) -> Result<Value, MeuralError> {
        self.get(&format!("control_command/set_orientation/{orientation}"))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn change_gallery(&self, gallery_id: &MediaId) -> Result<Value, MeuralError> {
        self.get(&format!("control_command/change_gallery/{gallery_id}"))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn change_item(&self, item_id: &MediaId) -> Result<Value, MeuralError> {
        self.get(&format!("control_command/change_item/{item_id}"))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_backlight(&self) -> Result<Value, MeuralError> {
        self.get("get_backlight/").await
    }

    /// `true` while the display is asleep.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_sleep(&self) -> Result<bool, MeuralError> {
        self.get_typed("control_check/sleep/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_system(&self) -> Result<Value, MeuralError> {
        self.get("control_check/system/").await
    }

    /// Flash the frame's identification overlay.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn identify(&self) -> Result<Value, MeuralError> {
        self.get("identify/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_wifi_connections(&self) -> Result<Value, MeuralError> {
        self.get("get_wifi_connections_json/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_galleries(&self) -> Result<Vec<Gallery>, MeuralError> {
        self.get_typed("get_galleries_json/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_gallery_status(&self) -> Result<GalleryStatus, MeuralError> {
        self.get_typed("get_gallery_status_json/").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_items_by_gallery(
        &self,
        gallery_id: &MediaId,
    ) -> Result<Vec<FrameItem>, MeuralError> {
        self.get_typed(&format!("get_frame_items_by_gallery_json/{gallery_id}"))
            .await
    }

    /// Push an image from `url` to the frame as a postcard.
    ///
    /// The image is downloaded first, then posted as the multipart field
    /// `photo`. A frame that answers with a status other than `pass` yields
    /// [`UploadOutcome::Rejected`]; the rejection is logged, not raised.
    ///
    /// # Errors
    ///
    /// Returns download and transport errors, and [`MeuralError::Decode`]
    /// when the acknowledgement is not JSON.
    pub async fn send_postcard(
        &self,
        url: &str,
        content_type: &str,
    ) -> Result<UploadOutcome, MeuralError> {
        let content_type = normalize_content_type(content_type);
        tracing::info!(frame = %self.alias, %url, content_type, "sending postcard");

        let image = media::download(&self.http, url, self.timeout).await?;
        tracing::info!(frame = %self.alias, bytes = image.len(), "downloaded postcard image");

        let part = Part::bytes(image)
            .file_name("postcard")
            .mime_str(content_type)?;
        let body = self
            .http
            .post(format!("{}/postcard", self.base))
            .timeout(self.timeout)
            .multipart(Form::new().part("photo", part))
            .send()
            .await
            .map_err(transport_error)?
            .bytes()
            .await?;

        let ack: UploadAck = serde_json::from_slice(&body)?;
        if ack.status == "pass" {
            tracing::info!(frame = %self.alias, "postcard uploaded");
            Ok(UploadOutcome::Accepted)
        } else {
            tracing::error!(
                frame = %self.alias,
                status = %ack.status,
                response = %ack.response,
                "frame refused postcard"
            );
            Ok(UploadOutcome::Rejected {
                status: ack.status,
                response: ack.response,
            })
        }
    }
}

fn transport_error(err: reqwest::Error) -> MeuralError {
    if err.is_connect() {
        MeuralError::DeviceTurnedOff(err)
    } else {
        MeuralError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(local_ip: Option<&str>) -> MeuralDevice {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "alias": "Hall",
            "localIp": local_ip,
        }))
        .unwrap()
    }

    #[test]
    fn should_parse_orientation_case_insensitively() {
        assert_eq!("Portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert_eq!("landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!("diagonal".parse::<Orientation>().is_err());
    }

    #[test]
    fn should_build_remote_base_url_from_device() {
        let client = LocalClient::for_device(
            reqwest::Client::new(),
            &device(Some("10.0.0.5")),
            &ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.5/remote/");
    }

    #[test]
    fn should_refuse_device_without_local_ip() {
        let result = LocalClient::for_device(
            reqwest::Client::new(),
            &device(None),
            &ClientConfig::default(),
        );
        assert!(matches!(result, Err(MeuralError::NoLocalAddress { .. })));
    }
}
