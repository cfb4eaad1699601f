//! Core data types for the xrf-conv crate.

pub mod database;

pub use database::{
    CosterKronig, Database, Edge, Element, EmissionLine, PhotoabsorptionTable, ScatterTable, Unit,
};
