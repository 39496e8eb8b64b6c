//! # meural-client
//!
//! Async clients for Meural digital art frames.
//!
//! Two independent clients share one [`reqwest::Client`]:
//!
//! | Client | Talks to | Auth | Envelope |
//! |--------|----------|------|----------|
//! | [`CloudClient`] | `https://api.meural.com/v0/` | `Authorization: Token <token>` | `{"data": ...}` |
//! | [`LocalClient`] | `http://<frame-ip>/remote/` | none | `{"response": ...}` |
//!
//! The cloud client owns the session token. It authenticates lazily, retries
//! a call exactly once when the token has expired, and reports every new
//! token through a callback so the caller can persist it.
//!
//! The local client drives a single frame over the LAN. A refused or
//! unreachable connection surfaces as [`MeuralError::DeviceTurnedOff`], which
//! callers treat as "the frame is asleep" rather than as a hard failure.
//!
//! Every call is bounded by [`ClientConfig::timeout`] (10 seconds by default).

pub mod cloud;
mod config;
mod error;
pub mod local;
mod media;
pub mod models;

pub use cloud::{CloudClient, Credentials, authenticate};
pub use config::ClientConfig;
pub use error::MeuralError;
pub use local::{LocalClient, Orientation, UnknownOrientation};
pub use media::normalize_content_type;
pub use models::{
    DeviceOptions, FrameItem, Gallery, GalleryStatus, Item, ItemMetadata, MediaId, MeuralDevice,
    UploadOutcome,
};
