//! Typed records of the Elam X-ray fluorescence reference database.
//!
//! The hierarchy mirrors the plain-text source: a [`Database`] owns
//! [`Element`]s, an element owns absorption [`Edge`]s and the tabulated
//! photoabsorption/scatter curves, and an edge owns its emission
//! [`EmissionLine`]s and Coster-Kronig transition maps. Every numeric
//! leaf has a statically known physical [`Unit`] (or none, for
//! dimensionless quantities) attached when the tree is lowered into the
//! store.

use ndarray::Array1;

/// Physical unit tag attached to a scalar or array leaf in the store.
///
/// Units are fixed by the identity of the leaf, never inferred from the
/// data. Dimensionless leaves carry no tag (`Option<Unit>` = `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    ElectronVolt,
    GramPerMole,
    GramPerCubicCentimeter,
    SquareCentimeterPerGram,
}

impl Unit {
    /// Attribute string stored alongside the tagged leaf.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::ElectronVolt => "eV",
            Unit::GramPerMole => "g/mol",
            Unit::GramPerCubicCentimeter => "g/cm^3",
            Unit::SquareCentimeterPerGram => "cm^2/g",
        }
    }

    /// Binary serialization byte. Zero is reserved for "no unit".
    pub fn to_wire_byte(self) -> u8 {
        match self {
            Unit::ElectronVolt => 1,
            Unit::GramPerMole => 2,
            Unit::GramPerCubicCentimeter => 3,
            Unit::SquareCentimeterPerGram => 4,
        }
    }

    /// Inverse of [`to_wire_byte`](Self::to_wire_byte).
    pub fn from_wire_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Unit::ElectronVolt),
            2 => Some(Unit::GramPerMole),
            3 => Some(Unit::GramPerCubicCentimeter),
            4 => Some(Unit::SquareCentimeterPerGram),
            _ => None,
        }
    }
}

/// Root container: the elements of the database in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    pub elements: Vec<Element>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an element by chemical symbol.
    pub fn element(&self, symbol: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.symbol == symbol)
    }
}

/// One chemical element with its edges and tabulated cross-sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Chemical symbol (e.g. `Fe`), unique within the database.
    pub symbol: String,
    pub atomic_number: u32,
    /// Molar mass in g/mol.
    pub molar_mass: f64,
    /// Mass density in g/cm^3.
    pub mass_density: f64,
    pub edges: Vec<Edge>,
    pub photoabsorption: Option<PhotoabsorptionTable>,
    pub scatter: Option<ScatterTable>,
}

impl Element {
    /// Look up an absorption edge by label (e.g. `K`, `L3`).
    pub fn edge(&self, label: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.label == label)
    }
}

/// One absorption edge of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Edge label (e.g. `K`, `L1`), unique within its element.
    pub label: String,
    /// Binding energy in eV.
    pub energy: f64,
    pub fluorescence_yield: f64,
    pub jump_ratio: f64,
    pub lines: Vec<EmissionLine>,
    pub coster_kronig: Option<CosterKronig>,
    pub coster_kronig_total: Option<CosterKronig>,
}

impl Edge {
    /// Look up an emission line by IUPAC symbol (e.g. `KL3`).
    pub fn line(&self, iupac: &str) -> Option<&EmissionLine> {
        self.lines.iter().find(|l| l.iupac == iupac)
    }
}

/// One characteristic emission line of an edge. Fully populated from a
/// single data row and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionLine {
    /// IUPAC transition symbol (e.g. `KL3`), unique within its edge.
    pub iupac: String,
    /// Siegbahn symbol (e.g. `Ka1`).
    pub siegbahn: String,
    /// Transition energy in eV.
    pub energy: f64,
    /// Relative intensity, dimensionless.
    pub intensity: f64,
}

/// Coster-Kronig transition rates keyed by final-level label.
///
/// The same shape serves both the direct and the total map; the two are
/// distinguished only by where they hang off the edge. Pairs keep the
/// order of the source line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CosterKronig {
    pub rates: Vec<(String, f64)>,
}

impl CosterKronig {
    pub fn rate(&self, level: &str) -> Option<f64> {
        self.rates.iter().find(|(l, _)| l == level).map(|(_, r)| *r)
    }
}

/// Log-log photoabsorption cross-section curve with spline coefficients.
///
/// Three equal-length columns, transposed from the fixed-width rows of
/// the source block.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoabsorptionTable {
    /// ln(energy), energy in eV.
    pub log_energy: Array1<f64>,
    /// ln(cross-section), cross-section in cm^2/g.
    pub log_photoabsorption: Array1<f64>,
    pub log_photoabsorption_spline: Array1<f64>,
}

impl PhotoabsorptionTable {
    pub fn len(&self) -> usize {
        self.log_energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_energy.is_empty()
    }
}

/// Log-log coherent/incoherent scatter curves with spline coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterTable {
    /// ln(energy), energy in eV.
    pub log_energy: Array1<f64>,
    /// ln(cross-section), cross-section in cm^2/g.
    pub log_coherent_scatter: Array1<f64>,
    pub log_coherent_scatter_spline: Array1<f64>,
    /// ln(cross-section), cross-section in cm^2/g.
    pub log_incoherent_scatter: Array1<f64>,
    pub log_incoherent_scatter_spline: Array1<f64>,
}

impl ScatterTable {
    pub fn len(&self) -> usize {
        self.log_energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_energy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_wire_bytes_round_trip() {
        for unit in [
            Unit::ElectronVolt,
            Unit::GramPerMole,
            Unit::GramPerCubicCentimeter,
            Unit::SquareCentimeterPerGram,
        ] {
            assert_eq!(Unit::from_wire_byte(unit.to_wire_byte()), Some(unit));
        }
        // Zero means "no unit" and must never decode to one.
        assert_eq!(Unit::from_wire_byte(0), None);
        assert_eq!(Unit::from_wire_byte(200), None);
    }

    #[test]
    fn lookups_by_key() {
        let db = Database {
            elements: vec![Element {
                symbol: "Fe".into(),
                atomic_number: 26,
                molar_mass: 55.845,
                mass_density: 7.874,
                edges: vec![Edge {
                    label: "K".into(),
                    energy: 7112.0,
                    fluorescence_yield: 0.34,
                    jump_ratio: 7.5,
                    lines: vec![EmissionLine {
                        iupac: "KL3".into(),
                        siegbahn: "Ka1".into(),
                        energy: 6404.0,
                        intensity: 0.58,
                    }],
                    coster_kronig: None,
                    coster_kronig_total: None,
                }],
                photoabsorption: None,
                scatter: None,
            }],
        };

        let edge = db.element("Fe").and_then(|e| e.edge("K")).unwrap();
        assert_eq!(edge.line("KL3").unwrap().siegbahn, "Ka1");
        assert!(db.element("Cu").is_none());
        assert!(edge.line("KL2").is_none());
    }
}
