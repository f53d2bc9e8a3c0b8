//! The value tree produced by the parser and consumed by the encoder.
//!
//! [`Value`] is a tagged union over null, booleans, a ladder of numeric
//! precision tiers, strings, dates, ordered containers, flattened primitive
//! arrays, and two open extension kinds: reflected host objects and
//! self-serializing objects.
//!
//! Containers are shared (`Rc<RefCell<...>>`) rather than inline, giving
//! them the reference identity of the source data model: two values can
//! hold the same object, and an object can erroneously contain itself,
//! which is exactly what the encoder's loop detector exists to catch.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::config::JsonConfig;
use crate::encoder::{self, ToJson};
use crate::reflect::Reflect;

/// An insertion-ordered, key-unique mapping.
pub type Object = IndexMap<String, Value>;

/// Shared handle to an object. Cloning the handle shares the container.
pub type ObjectRef = Rc<RefCell<Object>>;

/// Shared handle to an array. Cloning the handle shares the container.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A JSON-representable value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Date(DateTime<FixedOffset>),
    Object(ObjectRef),
    Array(ArrayRef),
    /// A flattened homogeneous array produced by the parser's
    /// primitive-array optimization.
    Primitives(PrimitiveArray),
    /// A host object encoded through the reflection mapper.
    Reflected(Rc<dyn Reflect>),
    /// A host object that serializes itself.
    Custom(Rc<dyn ToJson>),
}

/// Storage for a compacted homogeneous array.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bools(Vec<bool>),
    Chars(Vec<char>),
    Bytes(Vec<i8>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl PrimitiveArray {
    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::Bools(v) => v.len(),
            PrimitiveArray::Chars(v) => v.len(),
            PrimitiveArray::Bytes(v) => v.len(),
            PrimitiveArray::Shorts(v) => v.len(),
            PrimitiveArray::Ints(v) => v.len(),
            PrimitiveArray::Longs(v) => v.len(),
            PrimitiveArray::Floats(v) => v.len(),
            PrimitiveArray::Doubles(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl Value {
    /// A new empty shared object.
    pub fn object() -> Self {
        Self::Object(Rc::new(RefCell::new(Object::new())))
    }

    /// A shared object built from an iterator of pairs. Duplicate keys
    /// collapse, last write wins.
    pub fn object_from<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map: Object = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::Object(Rc::new(RefCell::new(map)))
    }

    /// A new empty shared array.
    pub fn array() -> Self {
        Self::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// A shared array built from an iterator of values.
    pub fn array_from<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Self::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// The shared object handle, if this is an object.
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(o) => Some(o.clone()),
            _ => None,
        }
    }

    /// The shared array handle, if this is an array.
    pub fn as_array(&self) -> Option<ArrayRef> {
        match self {
            Self::Array(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for every fixed-width or arbitrary-precision numeric kind.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::BigInt(_)
                | Self::Float(_)
                | Self::Double(_)
                | Self::Decimal(_)
        )
    }

    /// Kind name used in error messages and `Debug` output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Primitives(_) => "primitive array",
            Self::Reflected(r) => r.type_name(),
            Self::Custom(c) => c.type_name(),
        }
    }

    /// Exact decimal representation of a numeric value, used for
    /// cross-tier comparison. `None` for non-numeric kinds and for
    /// non-finite floats, which have no decimal representation.
    pub(crate) fn to_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Self::Byte(n) => Some(BigDecimal::from(*n)),
            Self::Short(n) => Some(BigDecimal::from(*n)),
            Self::Int(n) => Some(BigDecimal::from(*n)),
            Self::Long(n) => Some(BigDecimal::from(*n)),
            Self::BigInt(n) => Some(BigDecimal::from(n.clone())),
            Self::Float(f) if f.is_finite() => BigDecimal::from_str(&format!("{f}")).ok(),
            Self::Double(d) if d.is_finite() => BigDecimal::from_str(&format!("{d}")).ok(),
            Self::Decimal(d) => Some(d.clone()),
            _ => None,
        }
    }

    fn non_finite_eq(&self, other: &Self) -> bool {
        let (a, b) = match (self, other) {
            (Self::Float(a), Self::Float(b)) => (f64::from(*a), f64::from(*b)),
            (Self::Float(a), Self::Double(b)) => (f64::from(*a), *b),
            (Self::Double(a), Self::Float(b)) => (*a, f64::from(*b)),
            (Self::Double(a), Self::Double(b)) => (*a, *b),
            _ => return false,
        };
        // NaN stays unequal to itself; infinities compare by sign.
        a.is_infinite() && b.is_infinite() && a.signum() == b.signum()
    }
}

/// Numeric kinds compare numerically across tiers: `Byte(5)` equals
/// `Long(5)`, and `Float(4.0)` equals `Decimal("4.00")`. Containers compare
/// structurally; reflected and custom objects compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, va)| b.get(k).is_some_and(|vb| va == vb))
            }
            (Self::Array(a), Self::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Self::Primitives(a), Self::Primitives(b)) => a == b,
            (Self::Reflected(a), Self::Reflected(b)) => Rc::ptr_eq(a, b),
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            (a, b) if a.is_number() && b.is_number() => {
                match (a.to_big_decimal(), b.to_big_decimal()) {
                    (Some(x), Some(y)) => x == y,
                    _ => a.non_finite_eq(b),
                }
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Byte(n) => f.debug_tuple("Byte").field(n).finish(),
            Self::Short(n) => f.debug_tuple("Short").field(n).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Long(n) => f.debug_tuple("Long").field(n).finish(),
            Self::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Self::Decimal(n) => f.debug_tuple("Decimal").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(&o.borrow()).finish(),
            Self::Array(a) => f.debug_tuple("Array").field(&a.borrow()).finish(),
            Self::Primitives(p) => f.debug_tuple("Primitives").field(p).finish(),
            Self::Reflected(r) => write!(f, "Reflected({})", r.type_name()),
            Self::Custom(c) => write!(f, "Custom({})", c.type_name()),
        }
    }
}

/// Renders the value as compact JSON text under the default configuration.
/// Encoding failures (loops, bad property names) surface as `fmt::Error`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encoder::encode_to_writer(self, &JsonConfig::default(), f).map_err(|_| fmt::Error)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Self::BigInt(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Date(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(v)))
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(Rc::new(RefCell::new(v)))
    }
}

impl From<PrimitiveArray> for Value {
    fn from(v: PrimitiveArray) -> Self {
        Self::Primitives(v)
    }
}
