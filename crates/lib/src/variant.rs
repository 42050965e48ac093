//! Tagged values carried in portal signal payloads
//!
//! Signal bodies arrive as self-describing D-Bus values. Everything the
//! correlator and result parser read goes through [`Variant`], and every
//! read asserts the expected shape via `TryFrom`, failing with
//! [`VariantError`] rather than coercing.

use std::collections::HashMap;
use std::fmt;

use zvariant::{Signature, Value};

/// A decoded D-Bus value, restricted to the shapes portal responses use
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Bool(bool),
    U32(u32),
    Str(String),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
    Map(HashMap<String, Variant>),
    /// Any other value, kept only by its D-Bus signature
    Other(String),
}

/// Results mapping of a portal response
pub type Results = HashMap<String, Variant>;

impl Variant {
    /// Short shape name used in error messages
    pub fn kind(&self) -> Kind {
        match self {
            Variant::Bool(_) => Kind::Bool,
            Variant::U32(_) => Kind::U32,
            Variant::Str(_) => Kind::Str,
            Variant::Bytes(_) => Kind::Bytes,
            Variant::StrList(_) => Kind::StrList,
            Variant::Map(_) => Kind::Map,
            Variant::Other(_) => Kind::Other,
        }
    }
}

/// Shape of a [`Variant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    U32,
    Str,
    Bytes,
    StrList,
    Map,
    Other,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool (b)",
            Kind::U32 => "uint32 (u)",
            Kind::Str => "string (s)",
            Kind::Bytes => "byte array (ay)",
            Kind::StrList => "string array (as)",
            Kind::Map => "dict (a{sv})",
            Kind::Other => "unsupported value",
        };
        f.write_str(name)
    }
}

/// Shape mismatch while decoding a [`Variant`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariantError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: Kind, found: Kind },
    #[error("expected {expected} arguments, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("undecodable body: {0}")]
    Body(String),
}

impl VariantError {
    fn mismatch(expected: Kind, found: &Variant) -> Self {
        Self::Mismatch {
            expected,
            found: found.kind(),
        }
    }
}

macro_rules! impl_try_from_variant {
    ($ty:ty, $variant:ident, $kind:ident) => {
        impl TryFrom<Variant> for $ty {
            type Error = VariantError;

            fn try_from(value: Variant) -> Result<Self, Self::Error> {
                match value {
                    Variant::$variant(v) => Ok(v),
                    other => Err(VariantError::mismatch(Kind::$kind, &other)),
                }
            }
        }

        impl From<$ty> for Variant {
            fn from(v: $ty) -> Self {
                Variant::$variant(v)
            }
        }
    };
}

impl_try_from_variant!(bool, Bool, Bool);
impl_try_from_variant!(u32, U32, U32);
impl_try_from_variant!(String, Str, Str);
impl_try_from_variant!(Vec<u8>, Bytes, Bytes);
impl_try_from_variant!(Vec<String>, StrList, StrList);
impl_try_from_variant!(HashMap<String, Variant>, Map, Map);

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::Str(s.to_string())
    }
}

impl From<&Value<'_>> for Variant {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Bool(b) => Variant::Bool(*b),
            Value::U32(n) => Variant::U32(*n),
            Value::Str(s) => Variant::Str(s.as_str().to_string()),
            Value::Value(inner) => Variant::from(&**inner),
            Value::Array(array) => match array.element_signature() {
                Signature::U8 => Variant::Bytes(
                    array
                        .iter()
                        .filter_map(|v| match v {
                            Value::U8(b) => Some(*b),
                            _ => None,
                        })
                        .collect(),
                ),
                Signature::Str => Variant::StrList(
                    array
                        .iter()
                        .filter_map(|v| match v {
                            Value::Str(s) => Some(s.as_str().to_string()),
                            _ => None,
                        })
                        .collect(),
                ),
                _ => Variant::Other(value.value_signature().to_string()),
            },
            other => Variant::Other(other.value_signature().to_string()),
        }
    }
}

/// Convert a wire results dict into [`Results`]
pub fn results_from_wire(map: &HashMap<String, zvariant::OwnedValue>) -> Results {
    map.iter()
        .map(|(k, v)| (k.clone(), Variant::from(&**v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_scalars() {
        assert_eq!(Variant::from(&Value::from(7u32)), Variant::U32(7));
        assert_eq!(Variant::from(&Value::from(true)), Variant::Bool(true));
        assert_eq!(
            Variant::from(&Value::from("hello")),
            Variant::Str("hello".into())
        );
    }

    #[test]
    fn decodes_wire_arrays() {
        let uris = Value::from(vec!["file:///a", "file:///b"]);
        assert_eq!(
            Variant::from(&uris),
            Variant::StrList(vec!["file:///a".into(), "file:///b".into()])
        );

        let bytes = Value::from(vec![b'~', 0u8]);
        assert_eq!(Variant::from(&bytes), Variant::Bytes(vec![b'~', 0]));
    }

    #[test]
    fn unwraps_nested_variant() {
        let nested = Value::Value(Box::new(Value::from("inner")));
        assert_eq!(Variant::from(&nested), Variant::Str("inner".into()));
    }

    #[test]
    fn unknown_shapes_keep_signature() {
        let v = Variant::from(&Value::from(-3i32));
        assert_eq!(v, Variant::Other("i".into()));
    }

    #[test]
    fn try_from_rejects_wrong_shape() {
        let err = Vec::<String>::try_from(Variant::Str("file:///a".into())).unwrap_err();
        assert_eq!(
            err,
            VariantError::Mismatch {
                expected: Kind::StrList,
                found: Kind::Str
            }
        );
        assert!(err.to_string().contains("string array"));
    }

    #[test]
    fn try_from_accepts_matching_shape() {
        let n: u32 = Variant::U32(2).try_into().unwrap();
        assert_eq!(n, 2);
        let list: Vec<String> = Variant::from(vec!["x".to_string()]).try_into().unwrap();
        assert_eq!(list, vec!["x"]);
    }

    #[test]
    fn results_from_wire_converts_every_entry() {
        let mut wire = HashMap::new();
        wire.insert(
            "uris".to_string(),
            zvariant::OwnedValue::try_from(Value::from(vec!["file:///tmp/x"])).unwrap(),
        );
        let results = results_from_wire(&wire);
        assert_eq!(
            results.get("uris"),
            Some(&Variant::StrList(vec!["file:///tmp/x".into()]))
        );
    }
}
