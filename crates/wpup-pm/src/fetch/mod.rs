//! Verified sequential download.
//!
//! Each target is transferred until the local file has exactly the size the
//! source advertised. Only the length is compared: truncated or interrupted
//! transfers are caught, corruption that keeps the length is not. There is no
//! retry limit; a wrong advertised size keeps the loop going.

mod target;
mod transport;
mod wget;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub use target::{package_dir, DownloadTarget};
pub use transport::{
    HttpTransport, TransferProgress, Transport, TransportMode, DEFAULT_HELPER_BUILDS,
};
pub use wget::{parse_spider_length, WgetTransport, DEFAULT_HELPER};

use crate::Result;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Receives fetch events for display
pub trait FetchObserver: Send + Sync {
    fn started(&self, _index: usize, _total: usize, _target: &DownloadTarget, _expected: u64) {}

    fn progress(&self, _target: &DownloadTarget, _progress: &TransferProgress) {}

    fn retrying(&self, _target: &DownloadTarget, _expected: u64, _actual: u64, _attempt: u32) {}

    fn finished(&self, _target: &DownloadTarget) {}
}

impl FetchObserver for () {}

/// A package that reached its expected size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPackage {
    pub target: DownloadTarget,
    pub expected_len: u64,
    pub attempts: u32,
}

/// Downloads targets one at a time through a transport
pub struct Fetcher<T> {
    transport: T,
    retry_delay: Duration,
    last_progress: Mutex<Option<TransferProgress>>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry_delay: DEFAULT_RETRY_DELAY,
            last_progress: Mutex::new(None),
        }
    }

    /// Pause between a failed size check and the next attempt
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Most recent progress event of any transfer
    pub fn last_progress(&self) -> Option<TransferProgress> {
        self.last_progress.lock().ok().and_then(|last| *last)
    }

    /// Fetch every target in order. Only an unresolvable expected size or a
    /// failure to prepare the destination stops the run.
    pub async fn fetch(
        &self,
        targets: &[DownloadTarget],
        observer: &dyn FetchObserver,
    ) -> Result<Vec<FetchedPackage>> {
        let mut fetched = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            if let Some(parent) = target.destination.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let expected_len = self.transport.expected_len(target).await?;
            log::debug!("{} expects {} bytes", target.file_name, expected_len);
            observer.started(index, targets.len(), target, expected_len);

            let attempts = self.fetch_one(target, expected_len, observer).await;

            observer.finished(target);
            fetched.push(FetchedPackage {
                target: target.clone(),
                expected_len,
                attempts,
            });
        }

        log::info!("Fetched {} packages", fetched.len());
        Ok(fetched)
    }

    async fn fetch_one(
        &self,
        target: &DownloadTarget,
        expected_len: u64,
        observer: &dyn FetchObserver,
    ) -> u32 {
        let on_progress = |progress: TransferProgress| {
            if let Ok(mut last) = self.last_progress.lock() {
                *last = Some(progress);
            }
            observer.progress(target, &progress);
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            // A failed attempt leaves a short or missing file, which the size
            // check below turns into another attempt.
            if let Err(e) = self.transport.transfer(target, &on_progress).await {
                log::warn!("Transfer of {} failed: {}", target.file_name, e);
            }

            let actual = local_len(&target.destination).await;
            if actual == expected_len {
                return attempt;
            }

            log::warn!(
                "{} is {} bytes, expected {} (attempt {})",
                target.file_name,
                actual,
                expected_len,
                attempt
            );
            observer.retrying(target, expected_len, actual, attempt);
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

async fn local_len(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}
