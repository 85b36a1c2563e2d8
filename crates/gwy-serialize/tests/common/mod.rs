// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used)]

use std::any::Any;
use std::f64::consts::LN_2;

use gwy_serialize::{
    assign_clone, AssignError, Component, ComponentType, Deserialize, DeserializeError, Registry,
    Serializable, Slot, Unit, Unpacker, ValueRef,
};

/// Exercises every component type the built-in types leave out.
///
/// Components at their defaults are not written, except `raw` which always
/// holds exactly four bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SerTest {
    pub flag: bool,
    pub data: Vec<f64>,
    pub s: Option<String>,
    pub raw: [u8; 4],
    pub child: Option<Box<SerTest>>,
    pub dbl: f64,
    pub i16: i16,
    pub i32: i32,
    pub i64: i64,
    pub ss: Vec<String>,
}

impl Default for SerTest {
    fn default() -> Self {
        Self {
            flag: false,
            data: Vec::new(),
            s: None,
            raw: [0; 4],
            child: None,
            dbl: LN_2,
            i16: 0,
            i32: 0,
            i64: 0,
            ss: Vec::new(),
        }
    }
}

impl Serializable for SerTest {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn components(&self) -> Vec<Component<'_>> {
        let mut out = Vec::new();
        if self.flag {
            out.push(Component::new("flag", ValueRef::Boolean(true)));
        }
        if !self.data.is_empty() {
            out.push(Component::new("data", ValueRef::DoubleArray(&self.data)));
        }
        if let Some(s) = &self.s {
            out.push(Component::new("s", ValueRef::String(s)));
        }
        out.push(Component::new("raw", ValueRef::CharArray(&self.raw)));
        if let Some(child) = &self.child {
            out.push(Component::new("child", ValueRef::Object(&**child)));
        }
        if self.dbl.to_bits() != LN_2.to_bits() {
            out.push(Component::new("dbl", ValueRef::Double(self.dbl)));
        }
        if self.i16 != 0 {
            out.push(Component::new("i16", ValueRef::Int16(self.i16)));
        }
        if self.i32 != 0 {
            out.push(Component::new("i32", ValueRef::Int32(self.i32)));
        }
        if self.i64 != 0 {
            out.push(Component::new("i64", ValueRef::Int64(self.i64)));
        }
        if !self.ss.is_empty() {
            out.push(Component::new("ss", ValueRef::StringArray(&self.ss)));
        }
        out
    }

    fn duplicate(&self) -> Box<dyn Serializable> {
        Box::new(self.clone())
    }

    fn assign(&mut self, source: &dyn Serializable) -> Result<(), AssignError> {
        assign_clone(self, source)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Deserialize for SerTest {
    const TYPE_NAME: &'static str = "GwySerTest";

    fn deserialize(
        unpacker: &mut Unpacker<'_>,
        registry: &Registry,
    ) -> Result<Self, DeserializeError> {
        let mut slots = [
            Slot::new("flag", ComponentType::Boolean),
            Slot::new("data", ComponentType::DoubleArray),
            Slot::new("s", ComponentType::String),
            Slot::new("raw", ComponentType::CharArray),
            Slot::of::<SerTest>("child"),
            Slot::new("dbl", ComponentType::Double),
            Slot::new("i16", ComponentType::Int16),
            Slot::new("i32", ComponentType::Int32),
            Slot::new("i64", ComponentType::Int64),
            Slot::new("ss", ComponentType::StringArray),
        ];
        unpacker.unpack_object_struct(Self::TYPE_NAME, &mut slots, registry)?;
        let [flag, data, s, raw, child, dbl, short, int, long, ss] = &mut slots;

        let raw = raw.take_char_array().unwrap_or_else(|| vec![0; 4]);
        let raw: [u8; 4] = raw
            .as_slice()
            .try_into()
            .map_err(|_| DeserializeError::FixedLength {
                type_name: Self::TYPE_NAME,
                component: "raw",
                expected: 4,
                found: raw.len(),
            })?;

        Ok(Self {
            flag: flag.take_bool().unwrap_or(false),
            data: data.take_f64_array().unwrap_or_default(),
            s: s.take_string(),
            raw,
            child: child.take_object::<SerTest>().map(Box::new),
            dbl: dbl.take_f64().unwrap_or(LN_2),
            i16: short.take_i16().unwrap_or(0),
            i32: int.take_i32().unwrap_or(0),
            i64: long.take_i64().unwrap_or(0),
            ss: ss.take_string_array().unwrap_or_default(),
        })
    }
}

/// A boxed type that (improperly) carries an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tagged {
    pub unit: Unit,
}

impl Serializable for Tagged {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_boxed(&self) -> bool {
        true
    }

    fn components(&self) -> Vec<Component<'_>> {
        vec![Component::new("unit", ValueRef::Object(&self.unit))]
    }

    fn duplicate(&self) -> Box<dyn Serializable> {
        Box::new(self.clone())
    }

    fn assign(&mut self, source: &dyn Serializable) -> Result<(), AssignError> {
        assign_clone(self, source)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Deserialize for Tagged {
    const TYPE_NAME: &'static str = "GwyTestTagged";
    const BOXED: bool = true;

    fn deserialize(
        unpacker: &mut Unpacker<'_>,
        registry: &Registry,
    ) -> Result<Self, DeserializeError> {
        let mut slots = [Slot::of::<Unit>("unit")];
        unpacker.unpack_object_struct(Self::TYPE_NAME, &mut slots, registry)?;
        Ok(Self {
            unit: slots[0].take_object().unwrap_or_default(),
        })
    }
}

/// Built-in types plus the test types.
pub fn registry() -> Registry {
    let mut registry = Registry::with_builtin();
    registry.register::<SerTest>().register::<Tagged>();
    registry
}

/// Hand-assembles a legacy `Name NUL GTypeCode` component header.
pub fn legacy_header(name: &str, code: u32) -> Vec<u8> {
    let mut out = name.as_bytes().to_vec();
    out.push(0);
    out.extend_from_slice(&code.to_le_bytes());
    out
}

/// Hand-assembles a blob with 32-bit sizes.
pub fn blob32(type_name: &str, body: &[u8]) -> Vec<u8> {
    let mut out = type_name.as_bytes().to_vec();
    out.push(0);
    out.extend_from_slice(&u32::try_from(body.len()).unwrap().to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Hand-assembles a `Name NUL Type` component header.
pub fn header(name: &str, ctype: u8) -> Vec<u8> {
    let mut out = name.as_bytes().to_vec();
    out.push(0);
    out.push(ctype);
    out
}
