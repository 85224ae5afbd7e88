//! Delivery of the condensed report to a results endpoint.

use crate::error::ScreenError;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;

/// Time budget for the delivery request.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// POST the file at `path` to `endpoint` as `text/plain`.
///
/// # Errors
///
/// `ScreenError::File` if the report cannot be read, `ScreenError::Delivery`
/// if the request fails or the endpoint answers anything but 200.
pub async fn deliver_report<P: AsRef<Path>>(endpoint: &str, path: P) -> Result<(), ScreenError> {
    let path = path.as_ref();
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| ScreenError::file_error(path.display().to_string(), e.to_string()))?;

    let client = reqwest::Client::builder()
        .timeout(DELIVERY_TIMEOUT)
        .build()
        .map_err(|e| ScreenError::config(format!("Failed to create delivery HTTP client: {}", e)))?;

    tracing::debug!(endpoint, bytes = body.len(), "delivering report");

    let response = client
        .post(endpoint)
        .header(CONTENT_TYPE, "text/plain")
        .body(body)
        .send()
        .await
        .map_err(|e| ScreenError::delivery(None, format!("request to {} failed: {}", endpoint, e)))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ScreenError::delivery(
            Some(status.as_u16()),
            format!("unexpected status code from {}", endpoint),
        ));
    }

    tracing::info!(endpoint, "report delivered");
    Ok(())
}
