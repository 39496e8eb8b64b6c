//! Meural cloud API client.
//!
//! All calls except [`authenticate`] carry `Authorization: Token <token>` and
//! `x-meural-api-version: 3`, and answer with a `{"data": ...}` envelope.
//!
//! The session token sits behind an async mutex. A missing token is fetched
//! while holding the lock, so overlapping calls never authenticate twice.
//! When the cloud answers 401 to a token that was not fetched for this very
//! call, the token is dropped (only if nobody replaced it meanwhile) and the
//! call is retried exactly once.

use std::fmt;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::MeuralError;
use crate::media::{self, normalize_content_type};
use crate::models::{DeviceOptions, Gallery, Item, ItemMetadata, MediaId, MeuralDevice};

const API_VERSION_HEADER: &str = "x-meural-api-version";
const API_VERSION: &str = "3";

/// Account credentials exchanged for a session token.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

type TokenCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct CreatedItem {
    id: MediaId,
}

/// Exchange `credentials` for a session token.
///
/// # Errors
///
/// Returns [`MeuralError::InvalidAuth`] when the cloud answers 401, and
/// [`MeuralError::CannotConnect`] for a timeout, a transport error, any other
/// non-2xx status, or a body without a token.
pub async fn authenticate(
    http: &reqwest::Client,
    config: &ClientConfig,
    credentials: &Credentials,
) -> Result<String, MeuralError> {
    tracing::info!(username = %credentials.username, "authenticating with Meural cloud");

    let response = http
        .post(config.endpoint("authenticate"))
        .timeout(config.timeout())
        .form(&[
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ])
        .send()
        .await
        .map_err(|err| {
            tracing::info!(%err, "Meural authentication failed");
            MeuralError::CannotConnect(err)
        })?;

    if response.status() == StatusCode::UNAUTHORIZED {
        tracing::info!("Meural authentication rejected the credentials");
        return Err(MeuralError::InvalidAuth);
    }

    let body: TokenResponse = response
        .error_for_status()
        .map_err(MeuralError::CannotConnect)?
        .json()
        .await
        .map_err(MeuralError::CannotConnect)?;

    Ok(body.token)
}

/// Authenticated client for the Meural cloud API.
pub struct CloudClient {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Credentials,
    token: Mutex<Option<String>>,
    on_token_refresh: Option<TokenCallback>,
}

impl CloudClient {
    /// Create a client that will authenticate on its first call.
    #[must_use]
    pub fn new(config: ClientConfig, credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            credentials,
            token: Mutex::new(None),
            on_token_refresh: None,
        }
    }

    /// Share an existing HTTP connection pool.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Start from a previously persisted token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Mutex::new(Some(token.into()));
        self
    }

    /// Register a callback invoked with every newly fetched token.
    #[must_use]
    pub fn on_token_refresh<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_token_refresh = Some(Arc::new(callback));
        self
    }

    /// The HTTP client used for every call, shared with local clients.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token currently held, if any.
    pub async fn token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Perform an authenticated call and return the envelope's `data`.
    ///
    /// For `GET`, `data` is sent as query parameters; otherwise as a JSON
    /// body. An empty response body yields [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns the authentication error when no token can be obtained,
    /// [`MeuralError::Http`] for transport and status errors (including a
    /// 401 that survives the single retry), and [`MeuralError::Decode`] for a
    /// malformed envelope.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&Value>,
    ) -> Result<Value, MeuralError> {
        let url = self.config.endpoint(path);
        self.send_authorized(|http| {
            let builder = http.request(method.clone(), url.as_str());
            Ok(match data {
                Some(data) if method == Method::GET => builder.query(data),
                Some(data) => builder.json(data),
                None => builder,
            })
        })
        .await
    }

    async fn send_authorized<F>(&self, build: F) -> Result<Value, MeuralError>
    where
        F: Fn(&reqwest::Client) -> Result<RequestBuilder, MeuralError>,
    {
        let mut retried = false;
        loop {
            let (token, fresh) = self.current_token().await?;

            let response = build(&self.http)?
                .timeout(self.config.timeout())
                .header(AUTHORIZATION, format!("Token {token}"))
                .header(API_VERSION_HEADER, API_VERSION)
                .send()
                .await
                .inspect_err(|err| tracing::error!(%err, "Meural cloud request failed"))?;

            if response.status() == StatusCode::UNAUTHORIZED && !fresh && !retried {
                tracing::info!("Meural cloud rejected the session token, re-authenticating");
                self.invalidate(&token).await;
                retried = true;
                continue;
            }

            let body = response.error_for_status()?.bytes().await?;
            return decode_data(&body);
        }
    }

    /// Return the held token, fetching one first when none is held.
    ///
    /// The flag is `true` when the token was fetched by this call.
    async fn current_token(&self) -> Result<(String, bool), MeuralError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok((token.clone(), false));
        }

        let token = authenticate(&self.http, &self.config, &self.credentials).await?;
        if let Some(callback) = &self.on_token_refresh {
            callback(&token);
        }
        *guard = Some(token.clone());
        Ok((token, true))
    }

    /// Drop `rejected` unless another call already replaced it.
    async fn invalidate(&self, rejected: &str) {
        let mut guard = self.token.lock().await;
        if guard.as_deref() == Some(rejected) {
            *guard = None;
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, MeuralError> {
        let data = self.request(Method::GET, path, None).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_user(&self) -> Result<Value, MeuralError> {
        self.request(Method::GET, "user", None).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_user_items(&self) -> Result<Vec<Item>, MeuralError> {
        self.fetch("user/items").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_user_galleries(&self) -> Result<Vec<Gallery>, MeuralError> {
        self.fetch("user/galleries").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_user_devices(&self) -> Result<Vec<MeuralDevice>, MeuralError> {
        self.fetch("user/devices").await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_user_feedback(&self) -> Result<Value, MeuralError> {
        self.request(Method::GET, "user/feedback", None).await
    }

    /// Make the frame display a cloud gallery.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn device_load_gallery(
        &self,
        device_id: u64,
        gallery_id: &MediaId,
    ) -> Result<Value, MeuralError> {
        let path = format!("devices/{device_id}/galleries/{gallery_id}");
        self.request(Method::POST, &path, None).await
    }

    /// Make the frame display a single cloud item.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn device_load_item(
        &self,
        device_id: u64,
        item_id: &MediaId,
    ) -> Result<Value, MeuralError> {
        let path = format!("devices/{device_id}/items/{item_id}");
        self.request(Method::POST, &path, None).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_device(&self, device_id: u64) -> Result<MeuralDevice, MeuralError> {
        self.fetch(&format!("devices/{device_id}")).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_device_galleries(&self, device_id: u64) -> Result<Vec<Gallery>, MeuralError> {
        self.fetch(&format!("devices/{device_id}/galleries")).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn update_device(
        &self,
        device_id: u64,
        options: &DeviceOptions,
    ) -> Result<Value, MeuralError> {
        let body = serde_json::to_value(options)?;
        self.request(Method::PUT, &format!("devices/{device_id}"), Some(&body))
            .await
    }

    /// Ask the cloud to push its state to the frame.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn sync_device(&self, device_id: u64) -> Result<Value, MeuralError> {
        self.request(Method::POST, &format!("devices/{device_id}/sync"), None)
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get_item(&self, item_id: &MediaId) -> Result<Item, MeuralError> {
        self.fetch(&format!("items/{item_id}")).await
    }

    /// Show an arbitrary image on a frame through the cloud.
    ///
    /// Downloads `url`, uploads it as a new item, fills in its metadata,
    /// previews it on `device_id`, waits [`ClientConfig::preview_grace`],
    /// then deletes the item. Any failure aborts the sequence; the item is
    /// only deleted when every earlier step succeeded.
    ///
    /// Returns the id of the temporary item.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step.
    pub async fn send_postcard_cloud(
        &self,
        device_id: u64,
        url: &str,
        content_type: &str,
        metadata: &ItemMetadata,
    ) -> Result<MediaId, MeuralError> {
        let content_type = normalize_content_type(content_type);
        tracing::info!(device_id, %url, content_type, "previewing image via Meural cloud");

        let image = media::download(&self.http, url, self.config.timeout()).await?;
        tracing::info!(device_id, bytes = image.len(), "downloaded preview image");

        let items_url = self.config.endpoint("items");
        let created = self
            .send_authorized(|http| {
                let part = Part::bytes(image.clone())
                    .file_name("preview")
                    .mime_str(content_type)?;
                Ok(http
                    .post(items_url.as_str())
                    .multipart(Form::new().part("image", part)))
            })
            .await?;
        let CreatedItem { id: item_id } = serde_json::from_value(created)?;
        tracing::debug!(device_id, %item_id, "uploaded preview item");

        let patch = serde_json::to_value(metadata.to_patch())?;
        self.request(Method::PUT, &format!("items/{item_id}"), Some(&patch))
            .await?;

        self.request(
            Method::POST,
            &format!("devices/{device_id}/preview/{item_id}"),
            None,
        )
        .await?;

        tokio::time::sleep(self.config.preview_grace()).await;

        self.request(Method::DELETE, &format!("items/{item_id}"), None)
            .await?;
        tracing::info!(device_id, %item_id, "cloud preview finished, item deleted");

        Ok(item_id)
    }
}

fn decode_data(body: &[u8]) -> Result<Value, MeuralError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let envelope: DataEnvelope = serde_json::from_slice(body)?;
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_null_for_empty_body() {
        assert_eq!(decode_data(b"").unwrap(), Value::Null);
        assert_eq!(decode_data(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn should_unwrap_data_field() {
        let data = decode_data(br#"{"data": {"id": 3}}"#).unwrap();
        assert_eq!(data, serde_json::json!({"id": 3}));
    }

    #[test]
    fn should_return_null_when_data_is_missing() {
        assert_eq!(decode_data(br#"{"count": 0}"#).unwrap(), Value::Null);
    }

    #[test]
    fn should_fail_on_malformed_envelope() {
        assert!(matches!(
            decode_data(b"<html>"),
            Err(MeuralError::Decode(_))
        ));
    }

    #[test]
    fn should_redact_password_in_debug_output() {
        let credentials = Credentials::new("me@example.com", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn should_start_without_token_by_default() {
        let client = CloudClient::new(ClientConfig::default(), Credentials::new("a", "b"));
        assert!(client.token().await.is_none());

        let client = client.with_token("abc");
        assert_eq!(client.token().await.as_deref(), Some("abc"));
    }
}
