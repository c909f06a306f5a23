//! Transfers through an external `wget` process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::target::DownloadTarget;
use super::transport::{Transport, TransferProgress};
use crate::extension::find_ignore_case;
use crate::{Result, UpdaterError};

pub const DEFAULT_HELPER: &str = "wget";

/// Runs `wget --spider` to learn the size and `wget -c -O <destination>` to
/// transfer, resuming partial files. The helper draws its own progress bar.
#[derive(Debug, Clone)]
pub struct WgetTransport {
    program: PathBuf,
}

impl WgetTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for WgetTransport {
    fn default() -> Self {
        Self::new(DEFAULT_HELPER)
    }
}

#[async_trait]
impl Transport for WgetTransport {
    async fn expected_len(&self, target: &DownloadTarget) -> Result<u64> {
        let output = Command::new(&self.program)
            .arg(target.url.as_str())
            .arg("--spider")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| UpdaterError::HelperFailed {
                url: target.url.to_string(),
                reason: e.to_string(),
            })?;

        let log = String::from_utf8_lossy(&output.stderr);
        parse_spider_length(&log).ok_or_else(|| UpdaterError::UnknownLength {
            url: target.url.to_string(),
        })
    }

    async fn transfer(
        &self,
        target: &DownloadTarget,
        _progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<()> {
        let status = Command::new(&self.program)
            .args(transfer_args(target))
            .status()
            .await
            .map_err(|e| UpdaterError::HelperFailed {
                url: target.url.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(UpdaterError::HelperFailed {
                url: target.url.to_string(),
                reason: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

/// Helper arguments for one transfer. The output path is pinned to the
/// destination the size check reads.
fn transfer_args(target: &DownloadTarget) -> Vec<OsString> {
    vec![
        "-q".into(),
        "-c".into(),
        "-O".into(),
        target.destination.clone().into_os_string(),
        target.url.as_str().into(),
        "--no-check-certificate".into(),
        "--show-progress".into(),
    ]
}

/// Read the size from the `Length: 1234 (1.2K) [type]` line of a spider log
pub fn parse_spider_length(log: &str) -> Option<u64> {
    log.lines().find_map(|line| {
        let start = find_ignore_case(line, "Length:")? + "Length:".len();
        let token = line[start..].split_whitespace().next()?;
        token.replace(',', "").parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spider_length() {
        let log = "\
Spider mode enabled. Check if remote file exists.
--2017-10-26 15:07:10--  http://host/pkg.cab
Resolving host... 10.0.0.1
HTTP request sent, awaiting response... 200 OK
Length: 1843200 (1.8M) [application/octet-stream]
Remote file exists.
";
        assert_eq!(parse_spider_length(log), Some(1843200));
    }

    #[test]
    fn test_parse_spider_length_grouped_digits() {
        assert_eq!(parse_spider_length("Length: 1,843,200 (1.8M)"), Some(1843200));
    }

    #[test]
    fn test_parse_spider_length_unspecified() {
        assert_eq!(parse_spider_length("Length: unspecified [text/html]"), None);
        assert_eq!(parse_spider_length("HTTP request sent... 404 Not Found"), None);
    }

    #[test]
    fn test_transfer_writes_to_destination() {
        let target = DownloadTarget::resolve(
            "http://host/build/pkg.cab?token=abc",
            std::path::Path::new("/out/SERIAL/Packages"),
        )
        .unwrap();
        let args = transfer_args(&target);

        let output = args.iter().position(|a| a == "-O").unwrap();
        assert_eq!(args[output + 1], OsString::from("/out/SERIAL/Packages/pkg.cab"));
        assert!(args.iter().any(|a| a == "-c"));
        assert!(args.iter().any(|a| a == "http://host/build/pkg.cab?token=abc"));
    }

    #[test]
    fn test_missing_helper_is_an_error() {
        let transport = WgetTransport::new("/nonexistent/wget");
        let target =
            DownloadTarget::resolve("http://host/pkg.cab", std::path::Path::new("/tmp")).unwrap();

        let len = tokio_test::block_on(transport.expected_len(&target));
        tokio_test::assert_err!(&len);
        assert!(matches!(len, Err(UpdaterError::HelperFailed { .. })));

        let transfer = tokio_test::block_on(transport.transfer(&target, &|_: TransferProgress| {}));
        assert!(matches!(transfer, Err(UpdaterError::HelperFailed { .. })));
    }
}
