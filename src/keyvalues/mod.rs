//! An immutable KeyValues ("VDF") tree, with readers for the binary and text encodings.
//!
//! KeyValues documents are trees of named nodes. Leaves are scalars, inner nodes are objects.
//! There is no native array type: sequences are stored as objects whose children are named
//! `"0"`, `"1"`, ... and are read back by iterating [`KvNode::children`].
//!
//! Lookups never fail, a missing child is `None`. Only coercing a node which is present
//! (but is an object, or holds text which is not a number) produces an error.
pub mod binary;
pub mod text;
pub mod writer;

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::err::CoercionError;

#[derive(Debug, Clone, PartialEq)]
pub struct KvNode {
    pub name: String,
    pub value: KvValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    String(String),
    Int32(i32),
    Float32(f32),
    Pointer(i32),
    Color(u32),
    UInt64(u64),
    Int64(i64),
    Object(Vec<KvNode>),
}

impl KvNode {
    pub fn new(name: impl Into<String>, value: KvValue) -> Self {
        KvNode {
            name: name.into(),
            value,
        }
    }

    pub fn object(name: impl Into<String>, children: Vec<KvNode>) -> Self {
        KvNode::new(name, KvValue::Object(children))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        KvNode::new(name, KvValue::String(value.into()))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.value, KvValue::Object(_))
    }

    /// Returns the first child named `name`. Scalars have no children.
    pub fn get(&self, name: &str) -> Option<&KvNode> {
        self.children().find(|child| child.name == name)
    }

    /// Follows `path` one child at a time, `a.b.c` style.
    pub fn path(&self, path: &[&str]) -> Option<&KvNode> {
        path.iter().try_fold(self, |node, name| node.get(name))
    }

    /// Children of an object in document order. Empty for scalars.
    pub fn children(&self) -> std::slice::Iter<'_, KvNode> {
        match &self.value {
            KvValue::Object(children) => children.iter(),
            _ => <&[KvNode]>::default().iter(),
        }
    }

    pub fn to_string_value(&self) -> Result<String, CoercionError> {
        match &self.value {
            KvValue::String(s) => Ok(s.clone()),
            KvValue::Int32(v) | KvValue::Pointer(v) => Ok(v.to_string()),
            KvValue::Float32(v) => Ok(v.to_string()),
            KvValue::Color(v) => Ok(v.to_string()),
            KvValue::UInt64(v) => Ok(v.to_string()),
            KvValue::Int64(v) => Ok(v.to_string()),
            KvValue::Object(_) => Err(self.not_a_scalar()),
        }
    }

    pub fn to_i32(&self) -> Result<i32, CoercionError> {
        self.to_integer("i32")
    }

    pub fn to_u32(&self) -> Result<u32, CoercionError> {
        self.to_integer("u32")
    }

    pub fn to_i64(&self) -> Result<i64, CoercionError> {
        self.to_integer("i64")
    }

    pub fn to_u64(&self) -> Result<u64, CoercionError> {
        self.to_integer("u64")
    }

    fn to_integer<T: TryFrom<i128>>(&self, target: &'static str) -> Result<T, CoercionError> {
        let wide: i128 = match &self.value {
            KvValue::Int32(v) | KvValue::Pointer(v) => i128::from(*v),
            KvValue::Color(v) => i128::from(*v),
            KvValue::UInt64(v) => i128::from(*v),
            KvValue::Int64(v) => i128::from(*v),
            KvValue::Float32(v) if v.is_finite() => v.round() as i128,
            KvValue::Float32(v) => return Err(self.unparsable(v.to_string(), target)),
            KvValue::String(s) => s
                .trim()
                .parse::<i128>()
                .map_err(|_| self.unparsable(s.clone(), target))?,
            KvValue::Object(_) => return Err(self.not_a_scalar()),
        };

        T::try_from(wide).map_err(|_| self.unparsable(wide.to_string(), target))
    }

    fn not_a_scalar(&self) -> CoercionError {
        CoercionError::NotAScalar {
            name: self.name.clone(),
        }
    }

    fn unparsable(&self, value: String, target: &'static str) -> CoercionError {
        CoercionError::Unparsable {
            name: self.name.clone(),
            value,
            target,
        }
    }
}

impl fmt::Display for KvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvValue::String(s) => f.write_str(s),
            KvValue::Int32(v) | KvValue::Pointer(v) => write!(f, "{v}"),
            KvValue::Float32(v) => write!(f, "{v}"),
            KvValue::Color(v) => write!(f, "{v}"),
            KvValue::UInt64(v) => write!(f, "{v}"),
            KvValue::Int64(v) => write!(f, "{v}"),
            KvValue::Object(children) => write!(f, "[object with {} children]", children.len()),
        }
    }
}

impl Serialize for KvValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KvValue::String(s) => serializer.serialize_str(s),
            KvValue::Int32(v) | KvValue::Pointer(v) => serializer.serialize_i32(*v),
            KvValue::Float32(v) => serializer.serialize_f32(*v),
            KvValue::Color(v) => serializer.serialize_u32(*v),
            KvValue::UInt64(v) => serializer.serialize_u64(*v),
            KvValue::Int64(v) => serializer.serialize_i64(*v),
            KvValue::Object(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for child in children {
                    map.serialize_entry(&child.name, &child.value)?;
                }
                map.end()
            }
        }
    }
}

/// A node serializes as `{ name: value }`.
impl Serialize for KvNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}
