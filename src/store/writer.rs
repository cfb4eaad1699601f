//! Store persistence with an all-or-nothing commit.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::binary::{self, StoreError};
use super::tree::Group;
use crate::types::database::Database;

/// Persist `db` at `dest`.
///
/// Returns `Ok(false)` without touching the filesystem when `dest`
/// already exists, `Ok(true)` after a successful write. The container
/// is staged in a temporary file next to the destination and renamed
/// into place, so no failure path leaves a partial store behind.
pub fn write_database(db: &Database, dest: &Path) -> Result<bool, StoreError> {
    if dest.exists() {
        log::debug!("store {} already exists, skipping write", dest.display());
        return Ok(false);
    }

    let root = Group::from(db);
    let bytes = binary::serialize(&root);

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.persist(dest).map_err(|e| StoreError::Io(e.error))?;

    log::info!("wrote store {} ({} bytes)", dest.display(), bytes.len());
    Ok(true)
}

/// Read a persisted store back into its group tree.
pub fn read_store(path: &Path) -> Result<Group, StoreError> {
    let bytes = fs::read(path)?;
    binary::deserialize(&bytes)
}
