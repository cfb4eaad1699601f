//! Streaming parser and hierarchical builder for the Elam database.
//!
//! The driver walks the line source strictly forward, classifying each
//! line and dispatching to the record builder for its kind. Header
//! records are built from their own line; block records (emission
//! lines, photoabsorption and scatter tables) pull continuation rows
//! directly from the source and stop as soon as a non-continuation line
//! is peeked, leaving it for the driver. Parse state is an explicit
//! `(current element, current edge)` context threaded through the
//! builder calls, never ambient.

use ndarray::Array2;

use super::classify::{classify, LineKind};
use super::source::LineSource;
use crate::types::database::{
    CosterKronig, Database, Edge, Element, EmissionLine, PhotoabsorptionTable, ScatterTable,
};

/// Errors raised while parsing the plain-text database. All are fatal
/// to the conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ElamError {
    #[error("malformed {kind} record at line {line}: {detail}")]
    MalformedRecord {
        kind: &'static str,
        line: usize,
        detail: String,
    },

    #[error("structural error at line {line}: {detail}")]
    Structural { line: usize, detail: String },
}

/// Indices of the element/edge currently receiving nested records.
#[derive(Debug, Default)]
struct ParseContext {
    element: Option<usize>,
    edge: Option<usize>,
}

impl ParseContext {
    fn element_index(&self, line: usize, what: &'static str) -> Result<usize, ElamError> {
        self.element.ok_or_else(|| ElamError::Structural {
            line,
            detail: format!("{what} outside of any element"),
        })
    }

    fn edge_index(&self, line: usize, what: &'static str) -> Result<(usize, usize), ElamError> {
        let element = self.element_index(line, what)?;
        let edge = self.edge.ok_or_else(|| ElamError::Structural {
            line,
            detail: format!("{what} outside of any edge"),
        })?;
        Ok((element, edge))
    }
}

/// Parse the whole database from `source`.
///
/// Returns as soon as the end-of-database marker is seen; any remaining
/// lines are discarded. The source is never rewound.
pub fn parse_database(source: &mut LineSource) -> Result<Database, ElamError> {
    let mut db = Database::new();
    let mut ctx = ParseContext::default();

    while let Some(line) = source.pop() {
        let line_no = source.line_number();
        match classify(&line) {
            // Comments and filler consume no nested state.
            Some(LineKind::Comment) | None => {}

            Some(LineKind::ElementHeader) => {
                db.elements.push(build_element(&line, line_no)?);
                ctx.element = Some(db.elements.len() - 1);
                ctx.edge = None;
            }

            Some(LineKind::EdgeHeader) => {
                let element = ctx.element_index(line_no, "edge")?;
                let edges = &mut db.elements[element].edges;
                edges.push(build_edge(&line, line_no)?);
                ctx.edge = Some(edges.len() - 1);
            }

            Some(LineKind::LinesHeader) => {
                let (element, edge) = ctx.edge_index(line_no, "lines block")?;
                db.elements[element].edges[edge].lines = build_lines(source)?;
            }

            Some(LineKind::CosterKronigHeader) => {
                let (element, edge) = ctx.edge_index(line_no, "Coster-Kronig map")?;
                db.elements[element].edges[edge].coster_kronig =
                    Some(build_coster_kronig(&line, "Coster-Kronig map", line_no)?);
            }

            Some(LineKind::CosterKronigTotalHeader) => {
                let (element, edge) = ctx.edge_index(line_no, "Coster-Kronig total map")?;
                db.elements[element].edges[edge].coster_kronig_total = Some(
                    build_coster_kronig(&line, "Coster-Kronig total map", line_no)?,
                );
            }

            Some(LineKind::PhotoHeader) => {
                let element = ctx.element_index(line_no, "photoabsorption table")?;
                let data = build_numeric_block(source, 3, "photoabsorption row")?;
                db.elements[element].photoabsorption = Some(PhotoabsorptionTable {
                    log_energy: data.column(0).to_owned(),
                    log_photoabsorption: data.column(1).to_owned(),
                    log_photoabsorption_spline: data.column(2).to_owned(),
                });
            }

            Some(LineKind::ScatterHeader) => {
                let element = ctx.element_index(line_no, "scatter table")?;
                let data = build_numeric_block(source, 5, "scatter row")?;
                db.elements[element].scatter = Some(ScatterTable {
                    log_energy: data.column(0).to_owned(),
                    log_coherent_scatter: data.column(1).to_owned(),
                    log_coherent_scatter_spline: data.column(2).to_owned(),
                    log_incoherent_scatter: data.column(3).to_owned(),
                    log_incoherent_scatter_spline: data.column(4).to_owned(),
                });
            }

            Some(LineKind::EndElement) => {
                ctx.element_index(line_no, "end-of-element marker")?;
                ctx.element = None;
                ctx.edge = None;
            }

            Some(LineKind::EndDatabase) => return Ok(db),

            Some(LineKind::ContinuationRow) => {
                return Err(ElamError::Structural {
                    line: line_no,
                    detail: "data row outside of any block".to_string(),
                })
            }
        }
    }

    Err(ElamError::Structural {
        line: source.line_number(),
        detail: "input ended before end-of-database marker".to_string(),
    })
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

fn require_f64(tok: &str, kind: &'static str, line: usize) -> Result<f64, ElamError> {
    tok.parse().map_err(|_| ElamError::MalformedRecord {
        kind,
        line,
        detail: format!("expected float, got {tok:?}"),
    })
}

fn require_u32(tok: &str, kind: &'static str, line: usize) -> Result<u32, ElamError> {
    tok.parse().map_err(|_| ElamError::MalformedRecord {
        kind,
        line,
        detail: format!("expected integer, got {tok:?}"),
    })
}

/// `Element <symbol> <atomic number> <molar mass> <mass density>`
fn build_element(line: &str, line_no: usize) -> Result<Element, ElamError> {
    const KIND: &str = "element header";
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(ElamError::MalformedRecord {
            kind: KIND,
            line: line_no,
            detail: format!("expected 4 fields after keyword, got {}", fields.len() - 1),
        });
    }
    Ok(Element {
        symbol: fields[1].to_string(),
        atomic_number: require_u32(fields[2], KIND, line_no)?,
        molar_mass: require_f64(fields[3], KIND, line_no)?,
        mass_density: require_f64(fields[4], KIND, line_no)?,
        edges: Vec::new(),
        photoabsorption: None,
        scatter: None,
    })
}

/// `Edge <label> <energy> <fluorescence yield> <jump ratio>`
fn build_edge(line: &str, line_no: usize) -> Result<Edge, ElamError> {
    const KIND: &str = "edge header";
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(ElamError::MalformedRecord {
            kind: KIND,
            line: line_no,
            detail: format!("expected 4 fields after keyword, got {}", fields.len() - 1),
        });
    }
    Ok(Edge {
        label: fields[1].to_string(),
        energy: require_f64(fields[2], KIND, line_no)?,
        fluorescence_yield: require_f64(fields[3], KIND, line_no)?,
        jump_ratio: require_f64(fields[4], KIND, line_no)?,
        lines: Vec::new(),
        coster_kronig: None,
        coster_kronig_total: None,
    })
}

/// Consume emission-line rows following a `Lines` header. The
/// terminating line is left unconsumed.
fn build_lines(source: &mut LineSource) -> Result<Vec<EmissionLine>, ElamError> {
    const KIND: &str = "emission line";
    let mut lines = Vec::new();
    loop {
        match source.peek() {
            Some(next) if classify(next) == Some(LineKind::ContinuationRow) => {}
            _ => break,
        }
        let Some(row) = source.pop() else { break };
        let line_no = source.line_number();
        let toks: Vec<&str> = row.split_whitespace().collect();
        if toks.len() != 4 {
            return Err(ElamError::MalformedRecord {
                kind: KIND,
                line: line_no,
                detail: format!("expected 4 fields, got {}", toks.len()),
            });
        }
        lines.push(EmissionLine {
            iupac: toks[0].to_string(),
            siegbahn: toks[1].to_string(),
            energy: require_f64(toks[2], KIND, line_no)?,
            intensity: require_f64(toks[3], KIND, line_no)?,
        });
    }
    Ok(lines)
}

/// Build a Coster-Kronig map from the alternating `(level, rate)` pairs
/// that trail the header keyword. An odd pair count produces no partial
/// map, only an error.
fn build_coster_kronig(
    line: &str,
    kind: &'static str,
    line_no: usize,
) -> Result<CosterKronig, ElamError> {
    let toks: Vec<&str> = line.split_whitespace().collect();
    let pairs = &toks[1..];
    if pairs.len() % 2 != 0 {
        return Err(ElamError::MalformedRecord {
            kind,
            line: line_no,
            detail: format!("expected level/rate pairs, got {} trailing fields", pairs.len()),
        });
    }
    let mut rates = Vec::with_capacity(pairs.len() / 2);
    for pair in pairs.chunks_exact(2) {
        rates.push((pair[0].to_string(), require_f64(pair[1], kind, line_no)?));
    }
    Ok(CosterKronig { rates })
}

/// Consume fixed-width numeric rows into a row-major array; the caller
/// transposes by taking columns. A short or ragged row is fatal.
fn build_numeric_block(
    source: &mut LineSource,
    width: usize,
    kind: &'static str,
) -> Result<Array2<f64>, ElamError> {
    let mut data = Vec::new();
    let mut rows = 0;
    loop {
        match source.peek() {
            Some(next) if classify(next) == Some(LineKind::ContinuationRow) => {}
            _ => break,
        }
        let Some(row) = source.pop() else { break };
        let line_no = source.line_number();
        let toks: Vec<&str> = row.split_whitespace().collect();
        if toks.len() != width {
            return Err(ElamError::MalformedRecord {
                kind,
                line: line_no,
                detail: format!("expected {width} numeric fields, got {}", toks.len()),
            });
        }
        for tok in toks {
            data.push(require_f64(tok, kind, line_no)?);
        }
        rows += 1;
    }
    Array2::from_shape_vec((rows, width), data).map_err(|e| ElamError::MalformedRecord {
        kind,
        line: source.line_number(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(lines: &[&str]) -> LineSource {
        LineSource::new(lines.iter().map(|s| s.to_string()).collect())
    }

    fn parse(lines: &[&str]) -> Result<Database, ElamError> {
        parse_database(&mut source(lines))
    }

    #[test]
    fn minimal_element_no_edges() {
        let db = parse(&["Element H 1 1.008 0.0000899", "EndElement", "End"]).unwrap();
        assert_eq!(db.elements.len(), 1);
        let h = &db.elements[0];
        assert_eq!(h.symbol, "H");
        assert_eq!(h.atomic_number, 1);
        assert_eq!(h.molar_mass, 1.008);
        assert_eq!(h.mass_density, 0.0000899);
        assert!(h.edges.is_empty());
        assert!(h.photoabsorption.is_none());
        assert!(h.scatter.is_none());
    }

    #[test]
    fn edge_with_two_lines() {
        let db = parse(&[
            "Element Fe 26 55.845 7.874",
            "Edge K 7112.0 0.34 7.5",
            "  Lines",
            "    KL3 Ka1 6404.0 0.58",
            "    KL2 Ka2 6391.0 0.29",
            "EndElement",
            "End",
        ])
        .unwrap();
        let edge = db.element("Fe").and_then(|e| e.edge("K")).unwrap();
        assert_eq!(edge.energy, 7112.0);
        assert_eq!(edge.fluorescence_yield, 0.34);
        assert_eq!(edge.jump_ratio, 7.5);
        assert_eq!(edge.lines.len(), 2);
        assert_eq!(
            edge.lines[0],
            EmissionLine {
                iupac: "KL3".into(),
                siegbahn: "Ka1".into(),
                energy: 6404.0,
                intensity: 0.58,
            }
        );
        assert_eq!(edge.lines[1].iupac, "KL2");
        assert_eq!(edge.lines[1].intensity, 0.29);
    }

    #[test]
    fn lines_block_leaves_terminator_unconsumed() {
        let mut src = source(&[
            "    KL3 Ka1 6404.0 0.58",
            "    KL2 Ka2 6391.0 0.29",
            "EndElement",
        ]);
        let lines = build_lines(&mut src).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(src.peek(), Some("EndElement"));
    }

    #[test]
    fn photoabsorption_table_transposed() {
        let db = parse(&[
            "Element Fe 26 55.845 7.874",
            "Photo",
            "    1.0 2.0 3.0",
            "    4.0 5.0 6.0",
            "    7.0 8.0 9.0",
            "EndElement",
            "End",
        ])
        .unwrap();
        let photo = db.elements[0].photoabsorption.as_ref().unwrap();
        assert_eq!(photo.len(), 3);
        assert_eq!(photo.log_energy, ndarray::array![1.0, 4.0, 7.0]);
        assert_eq!(photo.log_photoabsorption, ndarray::array![2.0, 5.0, 8.0]);
        assert_eq!(
            photo.log_photoabsorption_spline,
            ndarray::array![3.0, 6.0, 9.0]
        );
    }

    #[test]
    fn scatter_table_five_columns() {
        let db = parse(&[
            "Element Fe 26 55.845 7.874",
            "Scatter",
            "    1.0 2.0 3.0 4.0 5.0",
            "    6.0 7.0 8.0 9.0 10.0",
            "EndElement",
            "End",
        ])
        .unwrap();
        let scatter = db.elements[0].scatter.as_ref().unwrap();
        assert_eq!(scatter.len(), 2);
        assert_eq!(scatter.log_energy, ndarray::array![1.0, 6.0]);
        assert_eq!(scatter.log_incoherent_scatter, ndarray::array![4.0, 9.0]);
        assert_eq!(
            scatter.log_incoherent_scatter_spline,
            ndarray::array![5.0, 10.0]
        );
    }

    #[test]
    fn coster_kronig_maps() {
        let db = parse(&[
            "Element Fe 26 55.845 7.874",
            "Edge L1 846.1 0.001 1.1",
            "  CK L2 0.3 L3 0.55",
            "  CKtotal L2 0.32 L3 0.6",
            "EndElement",
            "End",
        ])
        .unwrap();
        let edge = db.element("Fe").and_then(|e| e.edge("L1")).unwrap();
        let ck = edge.coster_kronig.as_ref().unwrap();
        assert_eq!(ck.rates.len(), 2);
        assert_eq!(ck.rate("L2"), Some(0.3));
        assert_eq!(ck.rate("L3"), Some(0.55));
        let total = edge.coster_kronig_total.as_ref().unwrap();
        assert_eq!(total.rate("L3"), Some(0.6));
    }

    #[test]
    fn odd_coster_kronig_tokens_are_malformed() {
        let err = parse(&[
            "Element Fe 26 55.845 7.874",
            "Edge L1 846.1 0.001 1.1",
            "  CK L2 0.3 L3",
            "EndElement",
            "End",
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ElamError::MalformedRecord {
                kind: "Coster-Kronig map",
                line: 3,
                ..
            }
        ));
    }

    #[test]
    fn edge_before_element_is_structural() {
        let err = parse(&["Edge K 7112.0 0.34 7.5", "End"]).unwrap_err();
        assert!(matches!(err, ElamError::Structural { line: 1, .. }));
    }

    #[test]
    fn end_element_without_element_is_structural() {
        let err = parse(&["EndElement", "End"]).unwrap_err();
        assert!(matches!(err, ElamError::Structural { line: 1, .. }));
    }

    #[test]
    fn data_row_outside_block_is_structural() {
        let err = parse(&[
            "Element Fe 26 55.845 7.874",
            "    1.0 2.0 3.0",
            "End",
        ])
        .unwrap_err();
        assert!(matches!(err, ElamError::Structural { line: 2, .. }));
    }

    #[test]
    fn missing_end_marker_is_structural() {
        let err = parse(&["Element H 1 1.008 0.0000899", "EndElement"]).unwrap_err();
        assert!(matches!(err, ElamError::Structural { .. }));
    }

    #[test]
    fn ragged_table_row_is_malformed() {
        let err = parse(&[
            "Element Fe 26 55.845 7.874",
            "Photo",
            "    1.0 2.0 3.0",
            "    4.0 5.0",
            "End",
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ElamError::MalformedRecord {
                kind: "photoabsorption row",
                line: 4,
                ..
            }
        ));
    }

    #[test]
    fn malformed_numeric_field_names_the_record() {
        let err = parse(&["Element H one 1.008 0.0000899", "End"]).unwrap_err();
        assert!(matches!(
            err,
            ElamError::MalformedRecord {
                kind: "element header",
                line: 1,
                ..
            }
        ));
    }

    #[test]
    fn wrong_header_arity_is_malformed() {
        let err = parse(&["Element H 1 1.008", "End"]).unwrap_err();
        assert!(matches!(
            err,
            ElamError::MalformedRecord {
                kind: "element header",
                ..
            }
        ));
    }

    #[test]
    fn comments_are_skipped_without_consuming_state() {
        let db = parse(&[
            "/ compiled by Elam, Ravel and Sieber",
            "Element Fe 26 55.845 7.874",
            "/ mid-element comment",
            "Edge K 7112.0 0.34 7.5",
            "EndElement",
            "End",
        ])
        .unwrap();
        assert_eq!(db.elements[0].edges.len(), 1);
    }

    #[test]
    fn end_database_discards_remaining_lines() {
        let db = parse(&[
            "Element H 1 1.008 0.0000899",
            "EndElement",
            "End",
            "Element Fe 26 55.845 7.874",
        ])
        .unwrap();
        assert_eq!(db.elements.len(), 1);
    }

    #[test]
    fn node_counts_match_input() {
        // Every record kind, two elements; counts below are computed by
        // hand from the header lines and continuation rows.
        let db = parse(&[
            "/ synthetic database",
            "Element Fe 26 55.845 7.874",
            "Edge K 7112.0 0.34 7.5",
            "  Lines",
            "    KL3 Ka1 6404.0 0.58",
            "    KL2 Ka2 6391.0 0.29",
            "    KM3 Kb1 7058.0 0.08",
            "Edge L1 846.1 0.001 1.1",
            "  CK L2 0.3 L3 0.55",
            "  CKtotal L2 0.32 L3 0.6",
            "Photo",
            "    1.0 2.0 3.0",
            "    4.0 5.0 6.0",
            "Scatter",
            "    1.0 2.0 3.0 4.0 5.0",
            "EndElement",
            "Element Cu 29 63.546 8.96",
            "Edge K 8979.0 0.44 8.0",
            "EndElement",
            "End",
        ])
        .unwrap();

        assert_eq!(db.elements.len(), 2);
        let fe = db.element("Fe").unwrap();
        assert_eq!(fe.edges.len(), 2);
        assert_eq!(fe.edge("K").unwrap().lines.len(), 3);
        assert_eq!(fe.edge("L1").unwrap().coster_kronig.as_ref().unwrap().rates.len(), 2);
        assert_eq!(fe.photoabsorption.as_ref().unwrap().len(), 2);
        assert_eq!(fe.scatter.as_ref().unwrap().len(), 1);
        let cu = db.element("Cu").unwrap();
        assert_eq!(cu.edges.len(), 1);
        assert!(cu.edge("K").unwrap().lines.is_empty());
    }
}
