// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Component values in borrowed (write) and owned (read) form.

use crate::ctype::ComponentType;
use crate::serializable::Serializable;

/// A component value borrowed from the object being written.
#[derive(Debug, Clone)]
pub enum ValueRef<'a> {
    /// `b`.
    Boolean(bool),
    /// `c`.
    Char(u8),
    /// `h`.
    Int16(i16),
    /// `i`.
    Int32(i32),
    /// `q`.
    Int64(i64),
    /// `d`.
    Double(f64),
    /// `s`.
    String(&'a str),
    /// `o`.
    Object(&'a dyn Serializable),
    /// `x`.
    Boxed(&'a dyn Serializable),
    /// `C`.
    CharArray(&'a [u8]),
    /// `H`.
    Int16Array(&'a [i16]),
    /// `I`.
    Int32Array(&'a [i32]),
    /// `Q`.
    Int64Array(&'a [i64]),
    /// `D`.
    DoubleArray(&'a [f64]),
    /// `S`.
    StringArray(&'a [String]),
    /// `O`.
    ObjectArray(Vec<&'a dyn Serializable>),
    /// `X`.
    BoxedArray(Vec<&'a dyn Serializable>),
}

impl ValueRef<'_> {
    /// Type tag the value is written with.
    pub fn ctype(&self) -> ComponentType {
        match self {
            Self::Boolean(_) => ComponentType::Boolean,
            Self::Char(_) => ComponentType::Char,
            Self::Int16(_) => ComponentType::Int16,
            Self::Int32(_) => ComponentType::Int32,
            Self::Int64(_) => ComponentType::Int64,
            Self::Double(_) => ComponentType::Double,
            Self::String(_) => ComponentType::String,
            Self::Object(_) => ComponentType::Object,
            Self::Boxed(_) => ComponentType::Boxed,
            Self::CharArray(_) => ComponentType::CharArray,
            Self::Int16Array(_) => ComponentType::Int16Array,
            Self::Int32Array(_) => ComponentType::Int32Array,
            Self::Int64Array(_) => ComponentType::Int64Array,
            Self::DoubleArray(_) => ComponentType::DoubleArray,
            Self::StringArray(_) => ComponentType::StringArray,
            Self::ObjectArray(_) => ComponentType::ObjectArray,
            Self::BoxedArray(_) => ComponentType::BoxedArray,
        }
    }
}

/// One named component of an object, listed in write order.
#[derive(Debug, Clone)]
pub struct Component<'a> {
    /// Component name, unique within the object.
    pub name: &'a str,
    /// The value.
    pub value: ValueRef<'a>,
}

impl<'a> Component<'a> {
    /// Pairs a name with a value.
    pub fn new(name: &'a str, value: ValueRef<'a>) -> Self {
        Self { name, value }
    }
}

/// A component value owned by the reader.
#[derive(Debug, Clone)]
pub enum Value {
    /// `b`.
    Boolean(bool),
    /// `c`.
    Char(u8),
    /// `h`.
    Int16(i16),
    /// `i`.
    Int32(i32),
    /// `q`.
    Int64(i64),
    /// `d`.
    Double(f64),
    /// `s`.
    String(String),
    /// `o`.
    Object(Box<dyn Serializable>),
    /// `x`.
    Boxed(Box<dyn Serializable>),
    /// `C`.
    CharArray(Vec<u8>),
    /// `H`.
    Int16Array(Vec<i16>),
    /// `I`.
    Int32Array(Vec<i32>),
    /// `Q`.
    Int64Array(Vec<i64>),
    /// `D`.
    DoubleArray(Vec<f64>),
    /// `S`.
    StringArray(Vec<String>),
    /// `O`.
    ObjectArray(Vec<Box<dyn Serializable>>),
    /// `X`.
    BoxedArray(Vec<Box<dyn Serializable>>),
}

impl Value {
    /// Type tag the value was stored with.
    pub fn ctype(&self) -> ComponentType {
        self.borrowed().ctype()
    }

    /// Borrows the value in write form.
    pub fn borrowed(&self) -> ValueRef<'_> {
        match self {
            Self::Boolean(v) => ValueRef::Boolean(*v),
            Self::Char(v) => ValueRef::Char(*v),
            Self::Int16(v) => ValueRef::Int16(*v),
            Self::Int32(v) => ValueRef::Int32(*v),
            Self::Int64(v) => ValueRef::Int64(*v),
            Self::Double(v) => ValueRef::Double(*v),
            Self::String(v) => ValueRef::String(v),
            Self::Object(v) => ValueRef::Object(&**v),
            Self::Boxed(v) => ValueRef::Boxed(&**v),
            Self::CharArray(v) => ValueRef::CharArray(v),
            Self::Int16Array(v) => ValueRef::Int16Array(v),
            Self::Int32Array(v) => ValueRef::Int32Array(v),
            Self::Int64Array(v) => ValueRef::Int64Array(v),
            Self::DoubleArray(v) => ValueRef::DoubleArray(v),
            Self::StringArray(v) => ValueRef::StringArray(v),
            Self::ObjectArray(v) => ValueRef::ObjectArray(v.iter().map(|o| &**o).collect()),
            Self::BoxedArray(v) => ValueRef::BoxedArray(v.iter().map(|o| &**o).collect()),
        }
    }
}
