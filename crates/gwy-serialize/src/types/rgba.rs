// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! RGBA colour, stored as a boxed value.

use std::any::Any;

use crate::ctype::ComponentType;
use crate::error::{AssignError, DeserializeError};
use crate::reader::{Slot, Unpacker};
use crate::registry::Registry;
use crate::serializable::{assign_clone, Deserialize, Serializable};
use crate::value::{Component, ValueRef};

/// Colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha, 1.0 is opaque.
    pub a: f64,
}

impl Rgba {
    /// Colour from its four components.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// The colour with every component clamped to `0.0..=1.0`.
    #[must_use]
    pub fn fix(self) -> Self {
        let c = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

impl Serializable for Rgba {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_boxed(&self) -> bool {
        true
    }

    fn components(&self) -> Vec<Component<'_>> {
        vec![
            Component::new("r", ValueRef::Double(self.r)),
            Component::new("g", ValueRef::Double(self.g)),
            Component::new("b", ValueRef::Double(self.b)),
            Component::new("a", ValueRef::Double(self.a)),
        ]
    }

    fn duplicate(&self) -> Box<dyn Serializable> {
        Box::new(*self)
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

impl Deserialize for Rgba {
    const TYPE_NAME: &'static str = "GwyRGBA";
    const BOXED: bool = true;

    fn deserialize(unpacker: &mut Unpacker<'_>, registry: &Registry) -> Result<Self, DeserializeError> {
        let mut slots = ["r", "g", "b", "a"].map(|name| Slot::new(name, ComponentType::Double));
        unpacker.unpack_object_struct(Self::TYPE_NAME, &mut slots, registry)?;
        let [r, g, b, a] = slots.map(|mut slot| slot.take_f64().unwrap_or_default());
        Ok(Self::new(r, g, b, a).fix())
    }
}
