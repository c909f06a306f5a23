//! Progress bars for downloads and staging.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use wpup_pm::{DownloadTarget, FetchObserver, TransferProgress};

use crate::output::Output;

/// Manages progress bars for downloads and copies
pub struct ProgressManager {
    multi: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_download_bar(&self, name: &str, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Bar counting files rather than bytes
    pub fn create_operation_bar(&self, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Shows one bar per package while the fetcher runs.
///
/// With bars disabled (the helper draws its own, or stderr is not a terminal)
/// each package is announced on its own line instead.
pub struct FetchProgress {
    bars: ProgressManager,
    output: Output,
    current: Mutex<Option<ProgressBar>>,
}

impl FetchProgress {
    pub fn new(output: Output, bars: bool) -> Self {
        Self {
            bars: ProgressManager::new(bars),
            output,
            current: Mutex::new(None),
        }
    }

    fn with_current(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(current) = self.current.lock() {
            if let Some(pb) = current.as_ref() {
                f(pb);
            }
        }
    }
}

impl FetchObserver for FetchProgress {
    fn started(&self, index: usize, total: usize, target: &DownloadTarget, expected: u64) {
        let label = format!("[{}/{}] {}", index + 1, total, target.file_name);
        if !self.bars.is_enabled() {
            self.output.writeln(&format!("{} ({})", label, format_bytes(expected)));
        }
        let pb = self.bars.create_download_bar(&label, expected);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(pb);
        }
    }

    fn progress(&self, _target: &DownloadTarget, progress: &TransferProgress) {
        self.with_current(|pb| pb.set_position(progress.received));
    }

    fn retrying(&self, target: &DownloadTarget, expected: u64, actual: u64, attempt: u32) {
        let message = format!(
            "{} has {} of {}, downloading again (attempt {})",
            target.file_name,
            format_bytes(actual),
            format_bytes(expected),
            attempt + 1
        );
        if self.bars.is_enabled() {
            self.with_current(|pb| {
                pb.println(&message);
                pb.set_position(0);
            });
        } else {
            self.output.warning(&message);
        }
    }

    fn finished(&self, _target: &DownloadTarget) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(pb) = current.take() {
                pb.finish();
            }
        }
    }
}

/// Helper to format bytes for display
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
