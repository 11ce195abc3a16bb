use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use moorage_core::CookieRecord;

#[async_trait]
pub trait CookieStore: Send + Sync {
    async fn save(&self, cookies: &[CookieRecord]) -> Result<()>;
    async fn load(&self) -> Result<Vec<CookieRecord>>;
}

/// Cookie file with one JSON object per line. Saving replaces the whole
/// file; loading a file that does not exist yields no cookies.
pub struct JsonlStore {
    pub path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CookieStore for JsonlStore {
    async fn save(&self, cookies: &[CookieRecord]) -> Result<()> {
        let mut data = String::new();
        for cookie in cookies {
            data.push_str(&serde_json::to_string(cookie)?);
            data.push('\n');
        }
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<CookieRecord>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut cookies = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            cookies.push(serde_json::from_str(line)?);
        }
        Ok(cookies)
    }
}
