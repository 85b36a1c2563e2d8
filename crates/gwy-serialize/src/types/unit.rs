// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Physical units as products of symbol powers.

use std::any::Any;
use std::fmt;

use crate::ctype::ComponentType;
use crate::error::{AssignError, DeserializeError};
use crate::reader::{Slot, Unpacker};
use crate::registry::Registry;
use crate::serializable::{assign_clone, Deserialize, Serializable};
use crate::value::{Component, ValueRef};

/// Largest absolute power kept for any symbol.
pub const MAX_POWER: i32 = 12;

/// A unit such as `m^2 s^-1`.
///
/// Kept canonical: each symbol appears once, no power is zero and every
/// power lies in `-MAX_POWER..=MAX_POWER`. Symbols keep the order in which
/// they first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    symbols: Vec<String>,
    powers: Vec<i32>,
}

impl Unit {
    /// The dimensionless unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single symbol to the first power.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::from_parts([(symbol, 1)])
    }

    /// Builds a unit from `(symbol, power)` pairs, merging repeats.
    pub fn from_parts<S: Into<String>>(parts: impl IntoIterator<Item = (S, i32)>) -> Self {
        let mut unit = Self::new();
        for (symbol, power) in parts {
            unit.multiply_symbol(symbol, power);
        }
        unit
    }

    /// Multiplies by `symbol^power` in place.
    pub fn multiply_symbol(&mut self, symbol: impl Into<String>, power: i32) {
        let symbol = symbol.into();
        match self.symbols.iter().position(|s| *s == symbol) {
            Some(k) => {
                let merged = self.powers[k].saturating_add(power).clamp(-MAX_POWER, MAX_POWER);
                if merged == 0 {
                    self.symbols.remove(k);
                    self.powers.remove(k);
                } else {
                    self.powers[k] = merged;
                }
            }
            None if power != 0 => {
                self.symbols.push(symbol);
                self.powers.push(power.clamp(-MAX_POWER, MAX_POWER));
            }
            None => {}
        }
    }

    /// Product of two units.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut product = self.clone();
        for (symbol, power) in other.parts() {
            product.multiply_symbol(symbol, power);
        }
        product
    }

    /// The unit raised to an integer power.
    #[must_use]
    pub fn power(&self, exponent: i32) -> Self {
        Self::from_parts(self.parts().map(|(s, p)| (s, p.saturating_mul(exponent))))
    }

    /// Whether the unit is dimensionless.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `(symbol, power)` pairs.
    pub fn parts(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.powers.iter().copied())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, (symbol, power)) in self.parts().enumerate() {
            if k > 0 {
                f.write_str(" ")?;
            }
            f.write_str(symbol)?;
            if power != 1 {
                write!(f, "^{power}")?;
            }
        }
        Ok(())
    }
}

impl Serializable for Unit {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn components(&self) -> Vec<Component<'_>> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![
            Component::new("units", ValueRef::StringArray(&self.symbols)),
            Component::new("powers", ValueRef::Int32Array(&self.powers)),
        ]
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

impl Deserialize for Unit {
    const TYPE_NAME: &'static str = "GwyUnit";

    fn deserialize(unpacker: &mut Unpacker<'_>, registry: &Registry) -> Result<Self, DeserializeError> {
        let mut slots = [
            Slot::new("units", ComponentType::StringArray),
            Slot::new("powers", ComponentType::Int32Array),
        ];
        unpacker.unpack_object_struct(Self::TYPE_NAME, &mut slots, registry)?;
        let [units, powers] = &mut slots;
        let symbols = units.take_string_array().unwrap_or_default();
        let powers = powers.take_i32_array().unwrap_or_default();
        if symbols.len() != powers.len() {
            return Err(DeserializeError::LengthMismatch {
                type_name: Self::TYPE_NAME,
                first: "units",
                first_len: symbols.len(),
                second: "powers",
                second_len: powers.len(),
            });
        }
        Ok(Self::from_parts(symbols.into_iter().zip(powers)))
    }
}
