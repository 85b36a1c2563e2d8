// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in serializable types.

mod container;
mod rgba;
mod surface;
mod unit;

pub use container::{Container, Item};
pub use rgba::Rgba;
pub use surface::Surface;
pub use unit::{Unit, MAX_POWER};
