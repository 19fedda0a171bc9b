use crate::cli::Cli;
use crate::commands::{load_settings, Result};
use crate::output::{format_output, OutputData};
use quarry_core::build_registry;

/// List the sources compiled into this binary.
pub fn run(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let registry = build_registry(&settings)?;
    let sources = registry.list_adapters();
    format_output(&OutputData::SourceList(&sources), cli.output)
}
