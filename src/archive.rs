//! Extraction of the packaged reference database.
//!
//! The upstream distribution is a zip archive holding one fixed-named
//! text member. Line-ending normalization happens here: the database is
//! CRLF-terminated, but plain LF input is accepted too.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

/// Fixed name of the database member inside the distribution archive.
pub const DATABASE_MEMBER: &str = "ElamDB12.txt";

/// Errors while opening or extracting the archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive member {0} is not valid UTF-8")]
    Encoding(&'static str),
}

/// Extract the database member and split it into normalized lines.
pub fn read_database_lines(path: &Path) -> Result<Vec<String>, ArchiveError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut member = archive.by_name(DATABASE_MEMBER)?;

    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes).map_err(|_| ArchiveError::Encoding(DATABASE_MEMBER))?;

    Ok(text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect())
}
