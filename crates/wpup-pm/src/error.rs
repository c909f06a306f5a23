use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum UpdaterError {
    // Input errors
    #[error("Inventory not found: {}", path.display())]
    InventoryNotFound { path: PathBuf },

    #[error("Invalid inventory line {line}: {reason}")]
    InvalidInventory { line: usize, reason: String },

    #[error("Manifest not found for build {build}: {}", path.display())]
    ManifestNotFound { build: String, path: PathBuf },

    #[error("Package folder not found: {}", path.display())]
    FolderNotFound { path: PathBuf },

    #[error("Not a package file: {entry}")]
    InvalidPackagePath { entry: String },

    #[error("Two selected packages are both named {name}")]
    DuplicatePackageName { name: String },

    // Download errors
    #[error("Invalid package URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Could not determine the size of {url}")]
    UnknownLength { url: String },

    #[error("Download helper failed for {url}: {reason}")]
    HelperFailed { url: String, reason: String },

    // Network errors
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Operator interaction errors
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
