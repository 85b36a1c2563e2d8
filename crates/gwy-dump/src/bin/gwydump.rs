// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for `gwydump`.

use std::process::ExitCode;

fn main() -> ExitCode {
    gwy_dump::cli::entrypoint()
}
