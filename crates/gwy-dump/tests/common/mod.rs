// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use gwy_serialize::{serialize_file, Container, Item, Rgba, SizeMode, Surface, Unit};
use tempfile::TempDir;

/// Points of the sample surface; `data` flattens them to 12 doubles.
pub const POINTS: [[f64; 3]; 4] = [
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 2.0],
    [0.0, 1.0, 3.0],
    [1.0, 1.0, 4.0],
];

pub fn sample_surface() -> Surface {
    let mut surface = Surface::from_points(&POINTS);
    surface.zunit = Unit::symbol("m");
    surface
}

/// A container whose components sort as `/0/data/title`, `mask`, `n`,
/// `surface`.
pub fn sample() -> Container {
    let mut container = Container::new();
    container.set("/0/data/title", Item::String("Topography".into()));
    container.set("n", Item::Int32(3));
    container.set_object("mask", Rgba::new(1.0, 0.0, 0.0, 0.5));
    container.set_object("surface", sample_surface());
    container
}

/// Containers nested `depth` levels under the key `c`, with an int32
/// `leaf` in the innermost one.
pub fn nested(depth: usize) -> Container {
    let mut inner = Container::new();
    inner.set("leaf", Item::Int32(42));
    for _ in 0..depth {
        let mut outer = Container::new();
        outer.set_object("c", inner);
        inner = outer;
    }
    inner
}

pub fn file_bytes(container: &Container) -> Vec<u8> {
    serialize_file(container, SizeMode::U32).unwrap()
}

/// Scratch directory holding data files and an empty config directory.
pub struct Scratch {
    pub dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("config")).unwrap();
        Self { dir }
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn set_config(&self, json: &str) {
        std::fs::write(self.config_dir().join("gwydump.json"), json).unwrap();
    }

    /// `gwydump` isolated from the user's own config.
    pub fn gwydump(&self, file: &Path) -> Command {
        let mut cmd = Command::cargo_bin("gwydump").unwrap();
        cmd.env_remove("GWYDUMP_LOG")
            .arg("--config-dir")
            .arg(self.config_dir())
            .arg(file);
        cmd
    }
}
