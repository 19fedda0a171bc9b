use crate::cli::Cli;
use crate::commands::{read_input, Result};
use crate::output::{format_output, OutputData};
use quarry_core::interpret;
use std::path::Path;

/// Parse a saved model reply without calling the model or any source.
pub fn run(cli: &Cli, response: &Path, note: Option<&Path>) -> Result<()> {
    let raw = read_input(response)?;
    let original = match note {
        Some(path) => read_input(path)?,
        None => String::new(),
    };

    let analysis = interpret(&raw, &original);
    format_output(&OutputData::Analysis(&analysis), cli.output)
}
