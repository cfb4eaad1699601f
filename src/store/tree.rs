//! In-memory model of the hierarchical store.
//!
//! The store is a tree of named [`Group`]s holding named [`Dataset`]s;
//! a dataset is a scalar or array [`Value`] with an optional physical
//! unit attribute. `From<&Database>` lowers the typed records into the
//! group layout that [`binary`](super::binary) persists.

use ndarray::Array1;

use crate::types::database::{CosterKronig, Database, Unit};

/// A scalar or array leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    FloatArray(Array1<f64>),
}

/// A named leaf with an optional unit attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub value: Value,
    pub unit: Option<Unit>,
}

/// A named node holding datasets and nested groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub name: String,
    pub datasets: Vec<Dataset>,
    pub groups: Vec<Group>,
}

impl Group {
    pub fn named(name: &str) -> Self {
        Group {
            name: name.to_string(),
            ..Group::default()
        }
    }

    /// Append a dataset.
    pub fn put(&mut self, name: &str, value: Value, unit: Option<Unit>) {
        self.datasets.push(Dataset {
            name: name.to_string(),
            value,
            unit,
        });
    }

    /// Get or create a child group.
    pub fn require_group(&mut self, name: &str) -> &mut Group {
        match self.groups.iter().position(|g| g.name == name) {
            Some(i) => &mut self.groups[i],
            None => {
                self.groups.push(Group::named(name));
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

fn put_coster_kronig(parent: &mut Group, name: &str, ck: &CosterKronig) {
    let group = parent.require_group(name);
    for (level, rate) in &ck.rates {
        group.put(level, Value::Float(*rate), None);
    }
}

impl From<&Database> for Group {
    /// Lower the typed records into the persisted group layout. Groups
    /// for edges, lines, maps and tables exist only where the element
    /// actually has them.
    fn from(db: &Database) -> Group {
        let mut root = Group::named("");
        for element in &db.elements {
            let el = root.require_group(&element.symbol);
            el.put(
                "atomic_number",
                Value::Int(i64::from(element.atomic_number)),
                None,
            );
            el.put(
                "molar_mass",
                Value::Float(element.molar_mass),
                Some(Unit::GramPerMole),
            );
            el.put(
                "mass_density",
                Value::Float(element.mass_density),
                Some(Unit::GramPerCubicCentimeter),
            );

            for edge in &element.edges {
                let eg = el.require_group("edges").require_group(&edge.label);
                eg.put(
                    "energy",
                    Value::Float(edge.energy),
                    Some(Unit::ElectronVolt),
                );
                eg.put(
                    "fluorescence_yield",
                    Value::Float(edge.fluorescence_yield),
                    None,
                );
                eg.put("jump_ratio", Value::Float(edge.jump_ratio), None);

                for line in &edge.lines {
                    let lg = eg.require_group("lines").require_group(&line.iupac);
                    lg.put("IUPAC_symbol", Value::Str(line.iupac.clone()), None);
                    lg.put("Siegbahn_symbol", Value::Str(line.siegbahn.clone()), None);
                    lg.put(
                        "energy",
                        Value::Float(line.energy),
                        Some(Unit::ElectronVolt),
                    );
                    lg.put("intensity", Value::Float(line.intensity), None);
                }

                if let Some(ck) = &edge.coster_kronig {
                    put_coster_kronig(eg, "Coster_Kronig", ck);
                }
                if let Some(ck) = &edge.coster_kronig_total {
                    put_coster_kronig(eg, "Coster_Kronig_total", ck);
                }
            }

            if let Some(photo) = &element.photoabsorption {
                let pg = el.require_group("photoabsorption");
                pg.put(
                    "log_energy",
                    Value::FloatArray(photo.log_energy.clone()),
                    Some(Unit::ElectronVolt),
                );
                pg.put(
                    "log_photoabsorption",
                    Value::FloatArray(photo.log_photoabsorption.clone()),
                    Some(Unit::SquareCentimeterPerGram),
                );
                pg.put(
                    "log_photoabsorption_spline",
                    Value::FloatArray(photo.log_photoabsorption_spline.clone()),
                    None,
                );
            }

            if let Some(scatter) = &element.scatter {
                let sg = el.require_group("scatter");
                sg.put(
                    "log_energy",
                    Value::FloatArray(scatter.log_energy.clone()),
                    Some(Unit::ElectronVolt),
                );
                sg.put(
                    "log_coherent_scatter",
                    Value::FloatArray(scatter.log_coherent_scatter.clone()),
                    Some(Unit::SquareCentimeterPerGram),
                );
                sg.put(
                    "log_coherent_scatter_spline",
                    Value::FloatArray(scatter.log_coherent_scatter_spline.clone()),
                    None,
                );
                sg.put(
                    "log_incoherent_scatter",
                    Value::FloatArray(scatter.log_incoherent_scatter.clone()),
                    Some(Unit::SquareCentimeterPerGram),
                );
                sg.put(
                    "log_incoherent_scatter_spline",
                    Value::FloatArray(scatter.log_incoherent_scatter_spline.clone()),
                    None,
                );
            }
        }
        root
    }
}
