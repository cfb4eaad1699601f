//! Syntactic line classification.
//!
//! Each line of the database is classified by a fixed, ordered list of
//! leading-token and indentation checks; the first match wins. The
//! prefixes are constants of the upstream database format. Nothing here
//! ever looks below the current line.

/// Record kind of a single text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    ElementHeader,
    EdgeHeader,
    LinesHeader,
    CosterKronigHeader,
    CosterKronigTotalHeader,
    PhotoHeader,
    ScatterHeader,
    EndElement,
    EndDatabase,
    Comment,
    ContinuationRow,
}

/// Minimum indentation that marks a data row inside a block.
const CONTINUATION_INDENT: &str = "    ";

/// Classify one line. Returns `None` for blank or otherwise
/// unrecognized filler lines, which the driver skips exactly like
/// comments.
pub fn classify(line: &str) -> Option<LineKind> {
    if line.starts_with('/') {
        Some(LineKind::Comment)
    } else if line.starts_with("Element") {
        Some(LineKind::ElementHeader)
    } else if line.starts_with("Edge") {
        Some(LineKind::EdgeHeader)
    } else if line.starts_with("  Lines") {
        Some(LineKind::LinesHeader)
    } else if line.starts_with("  CK ") {
        Some(LineKind::CosterKronigHeader)
    } else if line.starts_with("  CKtotal") {
        Some(LineKind::CosterKronigTotalHeader)
    } else if line.starts_with("Photo") {
        Some(LineKind::PhotoHeader)
    } else if line.starts_with("Scatter") {
        Some(LineKind::ScatterHeader)
    } else if line.starts_with("EndElement") {
        Some(LineKind::EndElement)
    } else if line.starts_with("End") {
        Some(LineKind::EndDatabase)
    } else if line.starts_with(CONTINUATION_INDENT) {
        Some(LineKind::ContinuationRow)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_prefixes() {
        assert_eq!(
            classify("Element Fe 26 55.845 7.874"),
            Some(LineKind::ElementHeader)
        );
        assert_eq!(
            classify("Edge K 7112.0 0.34 7.5"),
            Some(LineKind::EdgeHeader)
        );
        assert_eq!(classify("  Lines"), Some(LineKind::LinesHeader));
        assert_eq!(
            classify("  CK L2 0.1 L3 0.2"),
            Some(LineKind::CosterKronigHeader)
        );
        assert_eq!(
            classify("  CKtotal L2 0.1 L3 0.2"),
            Some(LineKind::CosterKronigTotalHeader)
        );
        assert_eq!(classify("Photo"), Some(LineKind::PhotoHeader));
        assert_eq!(classify("Scatter"), Some(LineKind::ScatterHeader));
    }

    #[test]
    fn end_element_wins_over_end_database() {
        assert_eq!(classify("EndElement"), Some(LineKind::EndElement));
        assert_eq!(classify("End"), Some(LineKind::EndDatabase));
    }

    #[test]
    fn comments_and_filler() {
        assert_eq!(
            classify("/ Elam, Ravel, Sieber database"),
            Some(LineKind::Comment)
        );
        assert_eq!(classify(""), None);
        assert_eq!(classify("  "), None);
        assert_eq!(classify("unrecognized"), None);
    }

    #[test]
    fn indentation_threshold() {
        assert_eq!(
            classify("    KL3 Ka1 6404.0 0.58"),
            Some(LineKind::ContinuationRow)
        );
        // Two leading spaces are not a data row.
        assert_eq!(classify("  KL3 Ka1 6404.0 0.58"), None);
    }
}
