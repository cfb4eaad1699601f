//! Binary container for the hierarchical store.
//!
//! Format (XRFDB01, all multi-byte values big-endian):
//! - 8-byte magic header: "XRFDB01\0"
//! - One group record for the root, where a group record is:
//!   - name: u16 length + UTF-8 bytes
//!   - u32 dataset count, then that many dataset records
//!   - u32 subgroup count, then that many group records (recursive)
//! - Dataset record:
//!   - name: u16 length + UTF-8 bytes
//!   - 1 byte type tag: 0 = i64, 1 = f64, 2 = string, 3 = f64 array
//!   - 1 byte unit tag: 0 = dimensionless, otherwise a `Unit` wire byte
//!   - payload: i64/f64 raw; string u32 length + UTF-8; array
//!     u32 element count + that many f64

use ndarray::Array1;

use super::tree::{Dataset, Group, Value};
use crate::types::database::Unit;

pub const STORE_MAGIC: &[u8; 8] = b"XRFDB01\0";

const TAG_INT: u8 = 0;
const TAG_FLOAT: u8 = 1;
const TAG_STR: u8 = 2;
const TAG_FLOAT_ARRAY: u8 = 3;

/// Errors from the store layer: container encoding and persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store format: {0}")]
    InvalidFormat(String),

    #[error("unknown {what} tag byte: {value}")]
    UnknownTag { what: &'static str, value: u8 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize a group tree to the XRFDB01 container.
pub fn serialize(root: &Group) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(STORE_MAGIC);
    write_group(&mut buffer, root);
    buffer
}

fn write_name(buffer: &mut Vec<u8>, name: &str) {
    debug_assert!(name.len() <= u16::MAX as usize);
    buffer.extend_from_slice(&(name.len() as u16).to_be_bytes());
    buffer.extend_from_slice(name.as_bytes());
}

fn write_group(buffer: &mut Vec<u8>, group: &Group) {
    write_name(buffer, &group.name);
    buffer.extend_from_slice(&(group.datasets.len() as u32).to_be_bytes());
    for dataset in &group.datasets {
        write_dataset(buffer, dataset);
    }
    buffer.extend_from_slice(&(group.groups.len() as u32).to_be_bytes());
    for child in &group.groups {
        write_group(buffer, child);
    }
}

fn write_dataset(buffer: &mut Vec<u8>, dataset: &Dataset) {
    write_name(buffer, &dataset.name);
    let unit_byte = dataset.unit.map_or(0, Unit::to_wire_byte);
    match &dataset.value {
        Value::Int(v) => {
            buffer.push(TAG_INT);
            buffer.push(unit_byte);
            buffer.extend_from_slice(&v.to_be_bytes());
        }
        Value::Float(v) => {
            buffer.push(TAG_FLOAT);
            buffer.push(unit_byte);
            buffer.extend_from_slice(&v.to_be_bytes());
        }
        Value::Str(s) => {
            buffer.push(TAG_STR);
            buffer.push(unit_byte);
            buffer.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buffer.extend_from_slice(s.as_bytes());
        }
        Value::FloatArray(a) => {
            buffer.push(TAG_FLOAT_ARRAY);
            buffer.push(unit_byte);
            buffer.extend_from_slice(&(a.len() as u32).to_be_bytes());
            for v in a.iter() {
                buffer.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deserialization
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], StoreError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.bytes.len());
        let Some(end) = end else {
            return Err(StoreError::InvalidFormat(format!(
                "truncated while reading {what} at byte offset {}",
                self.pos
            )));
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8, StoreError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16, StoreError> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32, StoreError> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self, what: &str) -> Result<i64, StoreError> {
        let b = self.take(8, what)?;
        Ok(i64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn f64(&mut self, what: &str) -> Result<f64, StoreError> {
        let b = self.take(8, what)?;
        Ok(f64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn name(&mut self, what: &str) -> Result<String, StoreError> {
        let len = self.u16(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| StoreError::InvalidFormat(format!("{what} is not valid UTF-8")))
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

/// Deserialize an XRFDB01 container back into a group tree.
pub fn deserialize(bytes: &[u8]) -> Result<Group, StoreError> {
    if bytes.len() < STORE_MAGIC.len() || &bytes[..STORE_MAGIC.len()] != STORE_MAGIC {
        return Err(StoreError::InvalidFormat(
            "bad or missing magic header".to_string(),
        ));
    }
    let mut reader = Reader {
        bytes,
        pos: STORE_MAGIC.len(),
    };
    let root = read_group(&mut reader)?;
    if !reader.is_empty() {
        return Err(StoreError::InvalidFormat(
            "trailing bytes after root group".to_string(),
        ));
    }
    Ok(root)
}

fn read_group(reader: &mut Reader) -> Result<Group, StoreError> {
    let name = reader.name("group name")?;
    let mut group = Group::named(&name);

    let n_datasets = reader.u32("dataset count")?;
    for _ in 0..n_datasets {
        group.datasets.push(read_dataset(reader)?);
    }

    let n_groups = reader.u32("subgroup count")?;
    for _ in 0..n_groups {
        group.groups.push(read_group(reader)?);
    }
    Ok(group)
}

fn read_dataset(reader: &mut Reader) -> Result<Dataset, StoreError> {
    let name = reader.name("dataset name")?;
    let type_tag = reader.u8("type tag")?;
    let unit_byte = reader.u8("unit tag")?;

    let unit = if unit_byte == 0 {
        None
    } else {
        Some(Unit::from_wire_byte(unit_byte).ok_or(StoreError::UnknownTag {
            what: "unit",
            value: unit_byte,
        })?)
    };

    let value = match type_tag {
        TAG_INT => Value::Int(reader.i64("int value")?),
        TAG_FLOAT => Value::Float(reader.f64("float value")?),
        TAG_STR => {
            let len = reader.u32("string length")? as usize;
            let bytes = reader.take(len, "string value")?;
            Value::Str(String::from_utf8(bytes.to_vec()).map_err(|_| {
                StoreError::InvalidFormat("string value is not valid UTF-8".to_string())
            })?)
        }
        TAG_FLOAT_ARRAY => {
            let len = reader.u32("array length")? as usize;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(reader.f64("array value")?);
            }
            Value::FloatArray(Array1::from_vec(values))
        }
        other => {
            return Err(StoreError::UnknownTag {
                what: "value type",
                value: other,
            })
        }
    };

    Ok(Dataset { name, value, unit })
}
