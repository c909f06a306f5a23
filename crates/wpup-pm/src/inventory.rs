//! Installed package inventory.
//!
//! The inventory is a comma-separated export of the packages installed on the
//! device. The first line is a header; the component key lives in a fixed column.

use std::path::Path;

use crate::{Result, UpdaterError};

/// Column holding the component key in the device export
pub const DEFAULT_KEY_FIELD: usize = 1;

/// One installed component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    pub key: String,
}

/// Installed components, in file order
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    records: Vec<ComponentRecord>,
}

impl Inventory {
    pub fn new(records: Vec<ComponentRecord>) -> Self {
        Self { records }
    }

    /// Build an inventory from bare component keys
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: keys
                .into_iter()
                .map(|key| ComponentRecord { key: key.into() })
                .collect(),
        }
    }

    pub fn load(path: &Path, key_field: usize) -> Result<Self> {
        if !path.exists() {
            return Err(UpdaterError::InventoryNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let inventory = Self::parse(&content, key_field)?;
        log::debug!(
            "Loaded {} installed components from {}",
            inventory.len(),
            path.display()
        );
        Ok(inventory)
    }

    /// Parse the export text. Blank lines are ignored; a non-blank line without
    /// the key column is an error.
    pub fn parse(content: &str, key_field: usize) -> Result<Self> {
        let mut records = Vec::new();

        for (index, line) in content.lines().enumerate().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let key = line.split(',').nth(key_field).ok_or_else(|| {
                UpdaterError::InvalidInventory {
                    line: index + 1,
                    reason: format!("missing field {}", key_field),
                }
            })?;
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            records.push(ComponentRecord {
                key: key.to_string(),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ComponentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
