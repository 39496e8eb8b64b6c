//! Helpers for fetching images that are pushed to a frame.

use std::time::Duration;

use crate::error::MeuralError;

/// Map content-type aliases the frame firmware rejects onto the canonical
/// type. Frames accept `image/jpeg` but not `image/jpg`.
#[must_use]
pub fn normalize_content_type(content_type: &str) -> &str {
    if content_type.eq_ignore_ascii_case("image/jpg") {
        "image/jpeg"
    } else {
        content_type
    }
}

/// Download the bytes behind `url`, bounded by `timeout`.
pub(crate) async fn download(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, MeuralError> {
    let response = http
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
