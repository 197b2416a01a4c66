//! Table index encoding (RFC 2578 Section 7.7).
//!
//! An instance OID is `<table>.1.<column>.<index>` where `<index>` is the
//! concatenation of each index value:
//!
//! | Type                         | Encoding                                   |
//! |------------------------------|--------------------------------------------|
//! | INTEGER, Unsigned32, ...     | one sub-identifier                         |
//! | IpAddress                    | four sub-identifiers                       |
//! | OCTET STRING                 | length, then one sub-identifier per octet  |
//! | OBJECT IDENTIFIER            | length, then the arcs                      |
//! | IMPLIED OCTET STRING / OID   | as above without the length                |
//!
//! IMPLIED values consume the rest of the OID, so they only make sense as the
//! last index.

use bytes::Bytes;

use crate::error::{Error, IndexErrorKind, Result};
use crate::oid::{MAX_OID_LEN, Oid};
use crate::value::{Value, ValueType};

/// Type of one index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    Integer,
    Gauge32,
    Counter32,
    TimeTicks,
    IpAddress,
    OctetString,
    ImpliedOctetString,
    ObjectIdentifier,
    ImpliedObjectIdentifier,
}

impl IndexType {
    /// The value type an index of this type decodes to.
    pub fn value_type(self) -> ValueType {
        match self {
            IndexType::Integer => ValueType::Integer,
            IndexType::Gauge32 => ValueType::Gauge32,
            IndexType::Counter32 => ValueType::Counter32,
            IndexType::TimeTicks => ValueType::TimeTicks,
            IndexType::IpAddress => ValueType::IpAddress,
            IndexType::OctetString | IndexType::ImpliedOctetString => ValueType::OctetString,
            IndexType::ObjectIdentifier | IndexType::ImpliedObjectIdentifier => {
                ValueType::ObjectIdentifier
            }
        }
    }

    pub fn is_implied(self) -> bool {
        matches!(
            self,
            IndexType::ImpliedOctetString | IndexType::ImpliedObjectIdentifier
        )
    }
}

/// Decode a complete index.
///
/// Every template entry must be present and no sub-identifiers may remain.
pub fn parse_index(template: &[IndexType], arcs: &[u32]) -> Result<Vec<Value>> {
    let (values, consumed) = decode(template, arcs)?;
    if consumed < arcs.len() {
        return Err(Error::index(IndexErrorKind::TrailingArcs {
            count: arcs.len() - consumed,
        }));
    }
    Ok(values)
}

/// Decode as many leading index values as the arcs allow.
///
/// Stops silently at the first value that is missing or malformed. Used for
/// GETNEXT, where a partial index just means "start within this range".
pub fn parse_index_prefix(template: &[IndexType], arcs: &[u32]) -> Vec<Value> {
    let mut values = Vec::with_capacity(template.len());
    let mut rest = arcs;
    for (position, ty) in template.iter().enumerate() {
        match decode_one(*ty, position, rest) {
            Ok((value, used)) => {
                values.push(value);
                rest = &rest[used..];
            }
            Err(_) => break,
        }
    }
    values
}

/// Encode `values` against `template` into index sub-identifiers.
pub fn build_index(template: &[IndexType], values: &[Value]) -> Result<Oid> {
    if values.len() != template.len() {
        return Err(Error::index(IndexErrorKind::MissingValue {
            expected: template.len(),
            actual: values.len(),
        }));
    }

    let mut oid = Oid::empty();
    for (position, (ty, value)) in template.iter().zip(values).enumerate() {
        let mismatch = || Error::index(IndexErrorKind::TypeMismatch { position });
        match (ty, value) {
            (IndexType::Integer, Value::Integer(v)) => push(&mut oid, position, &[*v as u32])?,
            (IndexType::Gauge32, Value::Gauge32(v))
            | (IndexType::Counter32, Value::Counter32(v))
            | (IndexType::TimeTicks, Value::TimeTicks(v)) => push(&mut oid, position, &[*v])?,
            (IndexType::IpAddress, Value::IpAddress(octets)) => {
                let arcs: Vec<u32> = octets.iter().map(|o| u32::from(*o)).collect();
                push(&mut oid, position, &arcs)?
            }
            (IndexType::OctetString, Value::OctetString(bytes)) => {
                let mut arcs = Vec::with_capacity(bytes.len() + 1);
                arcs.push(bytes.len() as u32);
                arcs.extend(bytes.iter().map(|b| u32::from(*b)));
                push(&mut oid, position, &arcs)?
            }
            (IndexType::ImpliedOctetString, Value::OctetString(bytes)) => {
                let arcs: Vec<u32> = bytes.iter().map(|b| u32::from(*b)).collect();
                push(&mut oid, position, &arcs)?
            }
            (IndexType::ObjectIdentifier, Value::ObjectIdentifier(v)) => {
                let mut arcs = Vec::with_capacity(v.len() + 1);
                arcs.push(v.len() as u32);
                arcs.extend_from_slice(v.arcs());
                push(&mut oid, position, &arcs)?
            }
            (IndexType::ImpliedObjectIdentifier, Value::ObjectIdentifier(v)) => {
                push(&mut oid, position, v.arcs())?
            }
            _ => return Err(mismatch()),
        }
    }
    Ok(oid)
}

fn push(oid: &mut Oid, position: usize, arcs: &[u32]) -> Result<()> {
    oid.extend_from_slice(arcs).map_err(|_| {
        Error::index(IndexErrorKind::TooLong {
            position,
            length: arcs.len(),
        })
    })
}

fn decode(template: &[IndexType], arcs: &[u32]) -> Result<(Vec<Value>, usize)> {
    let mut values = Vec::with_capacity(template.len());
    let mut consumed = 0;
    for (position, ty) in template.iter().enumerate() {
        let rest = &arcs[consumed..];
        if rest.is_empty() && !ty.is_implied() {
            return Err(Error::index(IndexErrorKind::MissingValue {
                expected: template.len(),
                actual: position,
            }));
        }
        let (value, used) = decode_one(*ty, position, rest)?;
        values.push(value);
        consumed += used;
    }
    Ok((values, consumed))
}

/// Decode one value from the front of `arcs`, returning it and the arcs used.
fn decode_one(ty: IndexType, position: usize, arcs: &[u32]) -> Result<(Value, usize)> {
    let missing = || {
        Error::index(IndexErrorKind::MissingValue {
            expected: position + 1,
            actual: position,
        })
    };
    let mismatch = || Error::index(IndexErrorKind::TypeMismatch { position });

    match ty {
        IndexType::Integer => {
            let arc = *arcs.first().ok_or_else(missing)?;
            Ok((Value::Integer(arc as i32), 1))
        }
        IndexType::Gauge32 => Ok((Value::Gauge32(*arcs.first().ok_or_else(missing)?), 1)),
        IndexType::Counter32 => Ok((Value::Counter32(*arcs.first().ok_or_else(missing)?), 1)),
        IndexType::TimeTicks => Ok((Value::TimeTicks(*arcs.first().ok_or_else(missing)?), 1)),
        IndexType::IpAddress => {
            let arcs = arcs.get(..4).ok_or_else(missing)?;
            let mut octets = [0u8; 4];
            for (octet, arc) in octets.iter_mut().zip(arcs) {
                *octet = u8::try_from(*arc).map_err(|_| mismatch())?;
            }
            Ok((Value::IpAddress(octets), 4))
        }
        IndexType::OctetString | IndexType::ObjectIdentifier => {
            let (&len, rest) = arcs.split_first().ok_or_else(missing)?;
            let len = len as usize;
            if len > MAX_OID_LEN || len > rest.len() {
                return Err(Error::index(IndexErrorKind::TooLong {
                    position,
                    length: len,
                }));
            }
            let value = decode_body(ty, position, &rest[..len])?;
            Ok((value, len + 1))
        }
        IndexType::ImpliedOctetString | IndexType::ImpliedObjectIdentifier => {
            if arcs.len() > MAX_OID_LEN {
                return Err(Error::index(IndexErrorKind::TooLong {
                    position,
                    length: arcs.len(),
                }));
            }
            Ok((decode_body(ty, position, arcs)?, arcs.len()))
        }
    }
}

fn decode_body(ty: IndexType, position: usize, arcs: &[u32]) -> Result<Value> {
    match ty.value_type() {
        ValueType::OctetString => {
            let bytes = arcs
                .iter()
                .map(|a| u8::try_from(*a))
                .collect::<std::result::Result<Vec<u8>, _>>()
                .map_err(|_| Error::index(IndexErrorKind::TypeMismatch { position }))?;
            Ok(Value::OctetString(Bytes::from(bytes)))
        }
        _ => Ok(Value::ObjectIdentifier(Oid::from_slice(arcs))),
    }
}
