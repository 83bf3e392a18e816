//! Build script rendering the manual pages for both binaries.
//!
//! Pages are written to `OUT_DIR` from the clap definitions in
//! `src/cli/mod.rs`, so the help text and the man pages cannot drift.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::{Cli, SweepCli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir =
        PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
        })?);

    render(&out_dir, "forecast-steps.1", Cli::command())?;
    render(&out_dir, "forecast-sweep.1", SweepCli::command())?;
    Ok(())
}

fn render(
    out_dir: &Path,
    file_name: &str,
    command: clap::Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    let mut file = File::create(out_dir.join(file_name))?;
    file.write_all(&buffer)?;
    Ok(())
}
