// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line front end of `gwydump`.
#![allow(clippy::print_stderr)]

use std::fs;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{limit, ConfigService, DumpPrefs, FsConfigStore};
use crate::path::Path;
use crate::walk::{detect, DumpOptions, FileFormat, WalkError, Walker};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GWYDUMP_LOG";

/// Dumps the object tree of a Gwyddion data file.
#[derive(Parser, Debug)]
#[command(name = "gwydump", version, about)]
pub struct Cli {
    /// File to dump.
    pub file: PathBuf,
    /// Print the offset of every component.
    #[arg(short, long)]
    pub offsets: bool,
    /// Print component type tags.
    #[arg(short, long)]
    pub types: bool,
    /// Print decoded values.
    #[arg(short, long)]
    pub values: bool,
    /// Print declared object sizes.
    #[arg(short, long)]
    pub sizes: bool,
    /// Same as -otvs.
    #[arg(short, long)]
    pub all: bool,
    /// Array items to print before eliding the rest (-1 for all).
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub length: Option<i64>,
    /// Deepest nesting level to print (-1 for all).
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub depth: Option<i64>,
    /// Spaces per nesting level.
    #[arg(short, long, value_name = "N")]
    pub indent: Option<usize>,
    /// Label components with full paths instead of names.
    #[arg(short, long)]
    pub paths: bool,
    /// Input is a bare blob without file magic.
    #[arg(short, long)]
    pub raw: bool,
    /// Raw input uses 64-bit sizes.
    #[arg(short, long)]
    pub quad: bool,
    /// Write the raw bytes of one component to stdout instead of dumping.
    #[arg(short = 'x', long, value_name = "PATH")]
    pub extract: Option<String>,
    /// Read defaults from this directory instead of the user config dir.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Cli {
    /// Layers the flags over `prefs`; flags win.
    pub fn options(&self, prefs: &DumpPrefs) -> Result<DumpOptions> {
        let mut options = prefs.to_options();
        options.offsets |= self.offsets || self.all;
        options.types |= self.types || self.all;
        options.values |= self.values || self.all;
        options.sizes |= self.sizes || self.all;
        options.paths |= self.paths;
        if let Some(indent) = self.indent {
            options.indent = indent;
        }
        if let Some(length) = self.length {
            options.length = limit(length);
        }
        if let Some(depth) = self.depth {
            options.depth = limit(depth);
        }
        options.extract = self
            .extract
            .as_deref()
            .map(Path::parse)
            .transpose()
            .context("invalid extract path")?;
        Ok(options)
    }

    fn prefs(&self) -> DumpPrefs {
        let store = match &self.config_dir {
            Some(dir) => FsConfigStore::at(dir),
            None => match FsConfigStore::new() {
                Ok(store) => store,
                Err(err) => {
                    tracing::warn!("no config directory: {err}");
                    return DumpPrefs::default();
                }
            },
        };
        debug!(dir = %store.base().display(), "reading defaults");
        DumpPrefs::load_or_default(&ConfigService::new(store))
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dumped, or extracted the requested component.
    Done,
    /// The extraction path matched nothing.
    NotFound,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => Self::SUCCESS,
            Outcome::NotFound => Self::from(2u8),
        }
    }
}

/// Runs one invocation, writing the dump or extracted bytes to `out`.
///
/// Lines printed before a structural failure stay in `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<Outcome> {
    let options = cli.options(&cli.prefs())?;
    let bytes = fs::read(&cli.file)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;
    let (format, start) = if cli.raw {
        let format = if cli.quad {
            FileFormat::Quad
        } else {
            FileFormat::Standard
        };
        (format, 0)
    } else {
        (detect(&bytes)?, FileFormat::MAGIC_LEN)
    };
    debug!(?format, len = bytes.len(), "walking");

    let walked = Walker::walk(&bytes, start, format, &options, out);
    out.flush()?;
    match walked? {
        Some(range) => {
            out.write_all(&bytes[range])?;
            out.flush()?;
            Ok(Outcome::Done)
        }
        None if options.extract.is_some() => Ok(Outcome::NotFound),
        None => Ok(Outcome::Done),
    }
}

/// Formats a failure the way the tool reports it on stderr.
pub fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<WalkError>() {
        Some(walk) => match walk.position() {
            Some(position) => format!("Error at position {position:08x}: {walk}"),
            None => format!("gwydump: {walk}"),
        },
        None => format!("gwydump: {err:#}"),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

/// Binary entry point.
pub fn entrypoint() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match run(&cli, &mut out) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("{}", describe(&err));
            ExitCode::FAILURE
        }
    }
}
