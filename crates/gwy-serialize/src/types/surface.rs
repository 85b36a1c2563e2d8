// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scattered XYZ data.

use std::any::Any;

use crate::ctype::ComponentType;
use crate::error::{AssignError, DeserializeError};
use crate::reader::{Slot, Unpacker};
use crate::registry::Registry;
use crate::serializable::{assign_clone, Deserialize, Serializable};
use crate::types::Unit;
use crate::value::{Component, ValueRef};

/// A set of `(x, y, z)` points with lateral and value units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    /// Unit of `x` and `y`.
    pub xyunit: Unit,
    /// Unit of `z`.
    pub zunit: Unit,
    /// Optional title.
    pub name: Option<String>,
    data: Vec<f64>,
}

impl Surface {
    /// Empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface holding the given points.
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self {
            data: points.iter().flatten().copied().collect(),
            ..Self::default()
        }
    }

    /// Appends a point.
    pub fn push(&mut self, x: f64, y: f64, z: f64) {
        self.data.extend_from_slice(&[x, y, z]);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.data.len() / 3
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Point `k`, if present.
    pub fn point(&self, k: usize) -> Option<[f64; 3]> {
        let start = k.checked_mul(3)?;
        let xyz = self.data.get(start..start.checked_add(3)?)?;
        Some([xyz[0], xyz[1], xyz[2]])
    }

    /// All points in order.
    pub fn points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.data.chunks_exact(3).map(|xyz| [xyz[0], xyz[1], xyz[2]])
    }

    /// Flat `x y z x y z ...` storage.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Smallest and largest `z`, `None` when empty.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.points().map(|[_, _, z]| z).fold(None, |acc, z| match acc {
            None => Some((z, z)),
            Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
        })
    }
}

impl Serializable for Surface {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn components(&self) -> Vec<Component<'_>> {
        let mut components = Vec::with_capacity(4);
        if !self.xyunit.is_empty() {
            components.push(Component::new("xyunit", ValueRef::Object(&self.xyunit)));
        }
        if !self.zunit.is_empty() {
            components.push(Component::new("zunit", ValueRef::Object(&self.zunit)));
        }
        if let Some(name) = &self.name {
            components.push(Component::new("name", ValueRef::String(name)));
        }
        components.push(Component::new("data", ValueRef::DoubleArray(&self.data)));
        components
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

impl Deserialize for Surface {
    const TYPE_NAME: &'static str = "GwySurface";

    fn deserialize(unpacker: &mut Unpacker<'_>, registry: &Registry) -> Result<Self, DeserializeError> {
        let mut slots = [
            Slot::of::<Unit>("xyunit"),
            Slot::of::<Unit>("zunit"),
            Slot::new("name", ComponentType::String),
            Slot::new("data", ComponentType::DoubleArray),
        ];
        unpacker.unpack_object_struct(Self::TYPE_NAME, &mut slots, registry)?;
        let [xyunit, zunit, name, data] = &mut slots;

        let data = data.take_f64_array().unwrap_or_default();
        if data.len() % 3 != 0 {
            return Err(DeserializeError::LengthNotMultiple {
                type_name: Self::TYPE_NAME,
                component: "data",
                len: data.len(),
                stride: 3,
            });
        }
        Ok(Self {
            xyunit: xyunit.take_object().unwrap_or_default(),
            zunit: zunit.take_object().unwrap_or_default(),
            name: name.take_string(),
            data,
        })
    }
}
