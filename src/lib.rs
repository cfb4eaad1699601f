//! Conversion of the Elam X-ray fluorescence reference database.
//!
//! Converts the plain-text database of fundamental X-ray fluorescence
//! parameters compiled by W.T. Elam, B.D. Ravel and J.R. Sieber
//! (Radiation Physics and Chemistry, 63 (2), 121 (2002)), distributed
//! as a zip archive, into a hierarchical data store of nested named
//! groups whose numeric leaves carry physical-unit attributes.
//!
//! Pipeline: [`archive`] extracts and normalizes the text lines,
//! [`elam`] parses them into the typed [`types::Database`] tree, and
//! [`store`] lowers that tree into named groups and commits it to disk
//! in a single atomic write.
//!
//! ```no_run
//! # fn main() -> Result<(), xrf_conv::ConvertError> {
//! use std::path::Path;
//!
//! xrf_conv::convert(Path::new("ElamDB12.zip"), Path::new("ref_data"))?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod elam;
pub mod store;
pub mod types;

use std::path::Path;

pub use archive::ArchiveError;
pub use elam::ElamError;
pub use store::StoreError;
pub use types::Database;

/// File name of the converted store inside the output directory.
pub const STORE_FILE_NAME: &str = "elamdb.xrf";

/// Any failure of a conversion run. All variants are fatal; the run is
/// aborted and the destination is left without a partial store.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Parse(#[from] ElamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convert the archived database at `input` into a store in
/// `output_dir`.
///
/// A no-op success when `output_dir/elamdb.xrf` already exists;
/// otherwise the whole database is parsed in memory and committed in
/// one atomic write.
pub fn convert(input: &Path, output_dir: &Path) -> Result<(), ConvertError> {
    let dest = output_dir.join(STORE_FILE_NAME);
    if dest.exists() {
        log::info!("{} already exists, nothing to do", dest.display());
        return Ok(());
    }

    let lines = archive::read_database_lines(input)?;
    log::debug!("extracted {} lines from {}", lines.len(), input.display());

    let mut source = elam::LineSource::new(lines);
    let db = elam::parse_database(&mut source)?;
    log::info!("parsed {} elements", db.elements.len());

    store::write_database(&db, &dest)?;
    Ok(())
}
