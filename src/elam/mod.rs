//! Streaming parser for the Elam plain-text reference database.
//!
//! Three-layer design mirroring the grammar:
//! - [`LineSource`]: forward-only cursor over the decoded lines.
//! - [`classify`]: purely syntactic line classification.
//! - [`parse_database`]: driver state machine and record builders.

pub mod classify;
pub mod parse;
pub mod source;

pub use classify::{classify, LineKind};
pub use parse::{parse_database, ElamError};
pub use source::LineSource;
