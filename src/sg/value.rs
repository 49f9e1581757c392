//! Dynamically typed node values
//!
//! Every scene graph node carries a [`Value`]. Parameters hold plain values
//! (numbers, vectors, strings, transforms), data nodes hold a [`DataArray`],
//! and renderer-backed nodes expose their object handle as
//! [`Value::Object`]. Typed access goes through [`FromValue`].

use std::fmt;

use cgmath::{Matrix4, Vector2, Vector3, Vector4};

use crate::device::ObjectHandle;

/// Discriminator for the variants of [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Bool,
    Int,
    Float,
    Vec2i,
    Vec2f,
    Vec3i,
    Vec3f,
    Vec4f,
    Affine,
    String,
    Data(DataKind),
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Vec2i => "vec2i",
            ValueKind::Vec2f => "vec2f",
            ValueKind::Vec3i => "vec3i",
            ValueKind::Vec3f => "vec3f",
            ValueKind::Vec4f => "vec4f",
            ValueKind::Affine => "affine3f",
            ValueKind::String => "string",
            ValueKind::Data(element) => return write!(f, "data<{element}>"),
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Element type of a [`DataArray`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Float,
    UInt,
    Vec2f,
    Vec3f,
    Vec4f,
    Vec3ui,
    Object,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataKind::Float => "float",
            DataKind::UInt => "uint",
            DataKind::Vec2f => "vec2f",
            DataKind::Vec3f => "vec3f",
            DataKind::Vec4f => "vec4f",
            DataKind::Vec3ui => "vec3ui",
            DataKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Typed array payload handed to the renderer as a data parameter
#[derive(Debug, Clone, PartialEq)]
pub enum DataArray {
    Float(Vec<f32>),
    UInt(Vec<u32>),
    Vec2f(Vec<Vector2<f32>>),
    Vec3f(Vec<Vector3<f32>>),
    Vec4f(Vec<Vector4<f32>>),
    Vec3ui(Vec<Vector3<u32>>),
    Objects(Vec<ObjectHandle>),
}

impl DataArray {
    /// Number of elements in the array
    pub fn len(&self) -> usize {
        match self {
            DataArray::Float(v) => v.len(),
            DataArray::UInt(v) => v.len(),
            DataArray::Vec2f(v) => v.len(),
            DataArray::Vec3f(v) => v.len(),
            DataArray::Vec4f(v) => v.len(),
            DataArray::Vec3ui(v) => v.len(),
            DataArray::Objects(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_kind(&self) -> DataKind {
        match self {
            DataArray::Float(_) => DataKind::Float,
            DataArray::UInt(_) => DataKind::UInt,
            DataArray::Vec2f(_) => DataKind::Vec2f,
            DataArray::Vec3f(_) => DataKind::Vec3f,
            DataArray::Vec4f(_) => DataKind::Vec4f,
            DataArray::Vec3ui(_) => DataKind::Vec3ui,
            DataArray::Objects(_) => DataKind::Object,
        }
    }
}

/// A dynamically typed node value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2i(Vector2<i32>),
    Vec2f(Vector2<f32>),
    Vec3i(Vector3<i32>),
    Vec3f(Vector3<f32>),
    Vec4f(Vector4<f32>),
    Affine(Matrix4<f32>),
    String(String),
    Data(DataArray),
    Object(ObjectHandle),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Vec2i(_) => ValueKind::Vec2i,
            Value::Vec2f(_) => ValueKind::Vec2f,
            Value::Vec3i(_) => ValueKind::Vec3i,
            Value::Vec3f(_) => ValueKind::Vec3f,
            Value::Vec4f(_) => ValueKind::Vec4f,
            Value::Affine(_) => ValueKind::Affine,
            Value::String(_) => ValueKind::String,
            Value::Data(d) => ValueKind::Data(d.element_kind()),
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Typed copy of the payload, `None` if the kind does not match
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("-"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Vec2i(v) => write!(f, "({}, {})", v.x, v.y),
            Value::Vec2f(v) => write!(f, "({}, {})", v.x, v.y),
            Value::Vec3i(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Value::Vec3f(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Value::Vec4f(v) => write!(f, "({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            Value::Affine(m) => write!(f, "affine(t = ({}, {}, {}))", m.w.x, m.w.y, m.w.z),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Data(d) => write!(f, "[{} x {}]", d.len(), d.element_kind()),
            Value::Object(h) => write!(f, "object#{}", h.0),
        }
    }
}

/// Typed extraction from a [`Value`]
pub trait FromValue: Sized {
    /// The kind a value must have to convert into `Self`
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! scalar_value {
    ($ty:ty, $variant:ident) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

scalar_value!(bool, Bool);
scalar_value!(i32, Int);
scalar_value!(f32, Float);
scalar_value!(Vector2<i32>, Vec2i);
scalar_value!(Vector2<f32>, Vec2f);
scalar_value!(Vector3<i32>, Vec3i);
scalar_value!(Vector3<f32>, Vec3f);
scalar_value!(Vector4<f32>, Vec4f);
scalar_value!(Matrix4<f32>, Affine);
scalar_value!(String, String);
scalar_value!(ObjectHandle, Object);

impl From<DataArray> for Value {
    fn from(v: DataArray) -> Self {
        Value::Data(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

macro_rules! data_value {
    ($elem:ty, $variant:ident) => {
        data_value!($elem, $variant, $variant);
    };
    ($elem:ty, $variant:ident, $kind:ident) => {
        impl FromValue for Vec<$elem> {
            const KIND: ValueKind = ValueKind::Data(DataKind::$kind);

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Data(DataArray::$variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<Vec<$elem>> for DataArray {
            fn from(v: Vec<$elem>) -> Self {
                DataArray::$variant(v)
            }
        }

        impl From<Vec<$elem>> for Value {
            fn from(v: Vec<$elem>) -> Self {
                Value::Data(DataArray::$variant(v))
            }
        }
    };
}

data_value!(f32, Float);
data_value!(u32, UInt);
data_value!(Vector2<f32>, Vec2f);
data_value!(Vector3<f32>, Vec3f);
data_value!(Vector4<f32>, Vec4f);
data_value!(Vector3<u32>, Vec3ui);
data_value!(ObjectHandle, Objects, Object);
