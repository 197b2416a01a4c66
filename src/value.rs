//! SNMP values.
//!
//! [`Value`] carries the typed payload of a varbind; [`ValueType`] names the
//! ASN.1 type alone and is what column templates and index templates compare
//! against.

use std::fmt;

use bytes::Bytes;

use crate::oid::Oid;

/// An SNMP value (RFC 2578 SMIv2 base types plus the RFC 3416 exceptions).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// INTEGER / Integer32.
    Integer(i32),
    /// OCTET STRING.
    OctetString(Bytes),
    /// NULL (placeholder value in requests).
    Null,
    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),
    /// IpAddress (4 octets, network order).
    IpAddress([u8; 4]),
    /// Counter32.
    Counter32(u32),
    /// Gauge32 / Unsigned32.
    Gauge32(u32),
    /// TimeTicks.
    TimeTicks(u32),
    /// Opaque.
    Opaque(Bytes),
    /// Counter64.
    Counter64(u64),
    /// noSuchObject exception.
    NoSuchObject,
    /// noSuchInstance exception.
    NoSuchInstance,
    /// endOfMibView exception.
    EndOfMibView,
}

impl Value {
    /// The ASN.1 type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::OctetString(_) => ValueType::OctetString,
            Value::Null => ValueType::Null,
            Value::ObjectIdentifier(_) => ValueType::ObjectIdentifier,
            Value::IpAddress(_) => ValueType::IpAddress,
            Value::Counter32(_) => ValueType::Counter32,
            Value::Gauge32(_) => ValueType::Gauge32,
            Value::TimeTicks(_) => ValueType::TimeTicks,
            Value::Opaque(_) => ValueType::Opaque,
            Value::Counter64(_) => ValueType::Counter64,
            Value::NoSuchObject => ValueType::NoSuchObject,
            Value::NoSuchInstance => ValueType::NoSuchInstance,
            Value::EndOfMibView => ValueType::EndOfMibView,
        }
    }

    /// Returns `true` for the three exception values.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Integer payload, if this is an INTEGER.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned payload for Counter32, Gauge32 and TimeTicks.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }

    /// Octet payload for OCTET STRING and Opaque.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b),
            _ => None,
        }
    }

    /// OID payload, if this is an OBJECT IDENTIFIER.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(b) | Value::Opaque(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => {
                    for byte in b.iter() {
                        write!(f, "{:02x}", byte)?;
                    }
                    Ok(())
                }
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => write!(f, "({})", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::OctetString(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

/// ASN.1 type of a [`Value`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    OctetString,
    Null,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Opaque,
    Counter64,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl ValueType {
    /// BER tag of the type (X.690 / RFC 3416).
    pub const fn tag(self) -> u8 {
        match self {
            ValueType::Integer => 0x02,
            ValueType::OctetString => 0x04,
            ValueType::Null => 0x05,
            ValueType::ObjectIdentifier => 0x06,
            ValueType::IpAddress => 0x40,
            ValueType::Counter32 => 0x41,
            ValueType::Gauge32 => 0x42,
            ValueType::TimeTicks => 0x43,
            ValueType::Opaque => 0x44,
            ValueType::Counter64 => 0x46,
            ValueType::NoSuchObject => 0x80,
            ValueType::NoSuchInstance => 0x81,
            ValueType::EndOfMibView => 0x82,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "INTEGER",
            ValueType::OctetString => "OCTET STRING",
            ValueType::Null => "NULL",
            ValueType::ObjectIdentifier => "OBJECT IDENTIFIER",
            ValueType::IpAddress => "IpAddress",
            ValueType::Counter32 => "Counter32",
            ValueType::Gauge32 => "Gauge32",
            ValueType::TimeTicks => "TimeTicks",
            ValueType::Opaque => "Opaque",
            ValueType::Counter64 => "Counter64",
            ValueType::NoSuchObject => "noSuchObject",
            ValueType::NoSuchInstance => "noSuchInstance",
            ValueType::EndOfMibView => "endOfMibView",
        };
        f.write_str(name)
    }
}

/// The RFC 3416 exception values a handler can answer with instead of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl From<Exception> for Value {
    fn from(exception: Exception) -> Self {
        match exception {
            Exception::NoSuchObject => Value::NoSuchObject,
            Exception::NoSuchInstance => Value::NoSuchInstance,
            Exception::EndOfMibView => Value::EndOfMibView,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_value_type() {
        assert_eq!(Value::Integer(1).value_type(), ValueType::Integer);
        assert_eq!(Value::from("x").value_type(), ValueType::OctetString);
        assert_eq!(
            Value::ObjectIdentifier(oid!(1, 3)).value_type(),
            ValueType::ObjectIdentifier
        );
        assert_eq!(ValueType::Counter64.tag(), 0x46);
    }

    #[test]
    fn test_value_exceptions() {
        assert!(Value::from(Exception::NoSuchInstance).is_exception());
        assert!(Value::EndOfMibView.is_exception());
        assert!(!Value::Null.is_exception());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-4).to_string(), "-4");
        assert_eq!(Value::IpAddress([10, 0, 0, 1]).to_string(), "10.0.0.1");
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[0xde, 0xad])).to_string(),
            "dead"
        );
    }
}
