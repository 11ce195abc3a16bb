use std::path::Path;

use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use moorage_core::WaitError;
use tracing::debug;

/// Captures the full page as PNG and writes it to `path`.
pub async fn capture(page: &Page, path: impl AsRef<Path>) -> Result<(), WaitError> {
    let params = CaptureScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .capture_beyond_viewport(true)
        .build();
    let bytes = page
        .screenshot(params)
        .await
        .map_err(|e| WaitError::Driver(format!("screenshot failed: {e}")))?;
    debug!(path = %path.as_ref().display(), bytes = bytes.len(), "screenshot captured");
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| WaitError::Driver(format!("failed to save screenshot: {e}")))?;
    Ok(())
}
