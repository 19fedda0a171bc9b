use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{load_settings, settings_store, CommandError, Result};
use crate::output::{format_output, OutputData};
use owo_colors::OwoColorize;
use quarry_core::settings::{Settings, SETTABLE_KEYS};
use std::io::{self, Write};

pub fn run(cli: &Cli, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => {
            println!("{}", settings_store(cli).path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(cli, *force),
        ConfigAction::Set { key, value } => set_config(cli, key, value.as_deref()),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let store = settings_store(cli);
    let settings = load_settings(cli)?.redacted();

    if cli.output == OutputFormat::Pretty && !store.exists() {
        println!();
        println!("{}", "No settings file yet; showing defaults.".yellow());
        println!("Run {} to write one.", "quarry config init".cyan());
    }

    format_output(
        &OutputData::Settings {
            path: store.path(),
            settings: &settings,
        },
        cli.output,
    )
}

fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let store = settings_store(cli);
    let written = if force {
        store.save(&Settings::default())?;
        true
    } else {
        store.init()?
    };

    if written {
        println!(
            "{} Wrote default settings to {}",
            "✓".green(),
            store.path().display().cyan()
        );
    } else {
        println!(
            "Settings already exist at {} (use {} to overwrite)",
            store.path().display().cyan(),
            "--force".yellow()
        );
    }
    Ok(())
}

fn set_config(cli: &Cli, key: &str, value: Option<&str>) -> Result<()> {
    if !SETTABLE_KEYS.contains(&key) {
        return Err(CommandError::InvalidInput(format!(
            "Unknown key '{}'. Valid keys: {}",
            key,
            SETTABLE_KEYS.join(", ")
        )));
    }

    let value = match value {
        Some(v) => v.to_string(),
        None => prompt_value(key)?,
    };

    // Env fallbacks are not applied here so they never end up on disk
    let store = settings_store(cli);
    let mut settings = store.load()?;
    settings.set(key, &value)?;
    store.save(&settings)?;

    let shown = if is_secret(key) && !value.trim().is_empty() {
        "********".to_string()
    } else {
        value
    };
    println!("{} {} = {}", "✓".green(), key.cyan(), shown);
    Ok(())
}

fn is_secret(key: &str) -> bool {
    key.ends_with("api_key")
}

fn prompt_value(key: &str) -> Result<String> {
    print!("{}: ", key.bold());
    io::stdout().flush()?;
    if is_secret(key) {
        return read_secret();
    }
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn read_secret() -> Result<String> {
    // Use rpassword for hidden input
    match rpassword::read_password() {
        Ok(password) => Ok(password.trim().to_string()),
        Err(_) => {
            // Fallback to regular input if rpassword fails (e.g., in non-TTY)
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input.trim().to_string())
        }
    }
}
