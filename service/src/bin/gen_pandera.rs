//! `gen-pandera` command-line tool
//!
//! Generates Pandera validator models from `LinkML` schemas and validates
//! records against them.

use linkml_pandera::cli::CliApp;

fn main() -> anyhow::Result<()> {
    CliApp::from_args().run()?;
    Ok(())
}
