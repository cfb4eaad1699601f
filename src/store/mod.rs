//! Hierarchical data store: in-memory group tree, binary container,
//! and the idempotent atomic writer.

pub mod binary;
pub mod tree;
pub mod writer;

pub use binary::{deserialize, serialize, StoreError, STORE_MAGIC};
pub use tree::{Dataset, Group, Value};
pub use writer::{read_store, write_database};
