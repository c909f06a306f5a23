//! Configuration for wpup.
//!
//! Settings are read from `wpup.toml`, found by searching upward from the
//! working directory. A few paths can be overridden with `WPUP_*` environment
//! variables; command-line flags override both.
//!
//! ```toml
//! [inventory]
//! path = "InstalledPackages.csv"
//! key_field = 1
//!
//! [manifest]
//! dir = "manifests"
//!
//! [selection]
//! excluded = ["Microsoft.BCD"]
//!
//! [download]
//! helper = "/usr/bin/wget"
//! helper_builds = ["15254.603"]
//!
//! [signer]
//! program = "osslsigncode"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fetch::{DEFAULT_HELPER, DEFAULT_HELPER_BUILDS};
use crate::http::HttpClientConfig;
use crate::inventory::DEFAULT_KEY_FIELD;
use crate::selection::SelectionRules;
use crate::signer::DEFAULT_SIGNER_PROGRAM;
use crate::Result;

pub const CONFIG_FILE_NAME: &str = "wpup.toml";

/// The wpup configuration file structure (wpup.toml)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub inventory: InventoryConfig,
    pub manifest: ManifestConfig,
    pub selection: SelectionRules,
    pub download: DownloadConfig,
    pub signer: SignerConfig,
}

/// Installed package export
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub path: PathBuf,
    /// Zero-based column of the component key
    pub key_field: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("InstalledPackages.csv"),
            key_field: DEFAULT_KEY_FIELD,
        }
    }
}

/// Build manifests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub dir: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("manifests"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// External download helper
    pub helper: PathBuf,
    /// Builds fetched with the helper instead of the built-in client
    pub helper_builds: Vec<String>,
    pub timeout_secs: u64,
    /// Request retries of the built-in client; size mismatches are always retried
    pub max_retries: u32,
    /// Pause between size-check attempts
    pub retry_delay_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            helper: PathBuf::from(DEFAULT_HELPER),
            helper_builds: DEFAULT_HELPER_BUILDS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 3600,
            max_retries: 3,
            retry_delay_secs: 1,
            user_agent: None,
        }
    }
}

impl DownloadConfig {
    pub fn http_client_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::new()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries);
        match &self.user_agent {
            Some(agent) => config.with_user_agent(agent.clone()),
            None => config,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Authenticode verifier used to read package signers
    pub program: PathBuf,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_SIGNER_PROGRAM),
        }
    }
}

impl UpdaterConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load wpup.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                return Self::load_file(&config_path).map(Some);
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `WPUP_INVENTORY`, `WPUP_MANIFEST_DIR` and `WPUP_HELPER`
    pub fn apply_env(&mut self) {
        if let Some(path) = env_path("WPUP_INVENTORY") {
            self.inventory.path = path;
        }
        if let Some(dir) = env_path("WPUP_MANIFEST_DIR") {
            self.manifest.dir = dir;
        }
        if let Some(helper) = env_path("WPUP_HELPER") {
            self.download.helper = helper;
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::KNOWN_REQUIREMENTS;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config() {
        let config = UpdaterConfig::parse("").unwrap();
        assert_eq!(config.inventory.key_field, 1);
        assert_eq!(config.download.helper_builds, vec!["15254.603"]);
        assert_eq!(config.selection.known_requirements.len(), KNOWN_REQUIREMENTS.len());
        assert!(config.selection.excluded.is_empty());
        assert_eq!(config.signer.program, PathBuf::from("osslsigncode"));
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
[inventory]
path = "/data/InstalledPackages.csv"
key_field = 2

[selection]
excluded = ["Microsoft.BCD"]

[download]
helper = "/usr/local/bin/wget"
helper_builds = ["15254.603", "15254.556"]
max_retries = 1
user_agent = "Test/1.0"
"#;
        let config = UpdaterConfig::parse(toml).unwrap();
        assert_eq!(config.inventory.path, PathBuf::from("/data/InstalledPackages.csv"));
        assert_eq!(config.inventory.key_field, 2);
        assert_eq!(config.selection.excluded, vec!["Microsoft.BCD"]);
        // Unset lists keep their defaults
        assert_eq!(config.selection.feature_packages.len(), 2);
        assert_eq!(config.download.helper_builds.len(), 2);

        let http = config.download.http_client_config();
        assert_eq!(http.max_retries, 1);
        assert_eq!(http.user_agent, "Test/1.0");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(UpdaterConfig::parse("[inventory]\nkey_field = \"one\"").is_err());
    }

    #[test]
    fn test_load_searches_upward() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "[manifest]\ndir = \"/srv/manifests\"\n").unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = UpdaterConfig::load(&nested).unwrap().unwrap();
        assert_eq!(config.manifest.dir, PathBuf::from("/srv/manifests"));
    }
}
