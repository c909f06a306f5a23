//! Transfer backends.

use async_trait::async_trait;
use chrono::{DateTime, Local};

use super::target::DownloadTarget;
use crate::http::HttpClient;
use crate::{Result, UpdaterError};

/// Builds that are fetched through the external helper by default
pub const DEFAULT_HELPER_BUILDS: &[&str] = &["15254.603"];

/// Latest progress event of the running transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub at: DateTime<Local>,
    pub received: u64,
    pub total: u64,
}

impl TransferProgress {
    pub fn now(received: u64, total: u64) -> Self {
        Self {
            at: Local::now(),
            received,
            total,
        }
    }

    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.received.saturating_mul(100) / self.total
        }
    }
}

/// Moves one package from its source to its destination
#[async_trait]
pub trait Transport: Send + Sync {
    /// Size the finished file must have
    async fn expected_len(&self, target: &DownloadTarget) -> Result<u64>;

    /// Run one transfer attempt. Returns once the transfer has fully stopped.
    async fn transfer(
        &self,
        target: &DownloadTarget,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<()>;
}

/// How packages are transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// `wget --spider` for the size, `wget -c` for the transfer
    Helper,
    /// Built-in HTTP client
    Http,
}

impl TransportMode {
    /// Helper builds are served from mirrors that only work reliably with the helper
    pub fn for_build(build: &str, helper_builds: &[String]) -> Self {
        if helper_builds.iter().any(|b| b == build) {
            TransportMode::Helper
        } else {
            TransportMode::Http
        }
    }
}

/// Transfers packages with the built-in HTTP client
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn expected_len(&self, target: &DownloadTarget) -> Result<u64> {
        self.client
            .content_length(target.url.as_str())
            .await?
            .ok_or_else(|| UpdaterError::UnknownLength {
                url: target.url.to_string(),
            })
    }

    async fn transfer(
        &self,
        target: &DownloadTarget,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<()> {
        self.client
            .download(
                target.url.as_str(),
                &target.destination,
                Some(|received, total| progress(TransferProgress::now(received, total))),
            )
            .await?;
        Ok(())
    }
}
