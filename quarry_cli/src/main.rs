use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON/YAML/Markdown
    let default_filter = match cli.verbose {
        0 => "quarry_cli=info,quarry_core=warn",
        1 => "quarry_cli=debug,quarry_core=debug",
        _ => "quarry_cli=trace,quarry_core=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        None => show_overview(),
        Some(Commands::Collect {
            note,
            title,
            source,
            limit,
            backend,
            show_abstracts,
            append,
        }) => {
            collect::run(
                &cli,
                collect::CollectArgs {
                    note,
                    title: title.as_deref(),
                    source: *source,
                    limit: *limit,
                    backend: *backend,
                    show_abstracts: *show_abstracts,
                    append: *append,
                },
            )
            .await
        }
        Some(Commands::Search {
            queries,
            source,
            limit,
            show_abstracts,
        }) => search::run(&cli, queries, *source, *limit, *show_abstracts).await,
        Some(Commands::Interpret { response, note }) => {
            interpret::run(&cli, response, note.as_deref())
        }
        Some(Commands::Sources) => sources::run(&cli),
        Some(Commands::Config { action }) => config::run(&cli, action),
    };

    if let Err(e) = result {
        if cli.output == cli::OutputFormat::Json {
            println!("{}", serde_json::json!({ "error": e.to_json() }));
        } else {
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
        process::exit(1);
    }
}

fn show_overview() -> commands::Result<()> {
    println!();
    println!(
        "{}  {}",
        "Quarry".bold().cyan(),
        "- from research note to reading list".dimmed()
    );
    println!();

    println!("{}", "Quick Start:".bold().cyan());
    println!(
        "  {}{}",
        "quarry collect notes/sleep.md".cyan(),
        "            Analyse a note and find papers".dimmed()
    );
    println!(
        "  {}{}",
        "quarry search \"gut microbiome\" -s all".cyan(),
        "    Search every source directly".dimmed()
    );
    println!(
        "  {}{}",
        "quarry config init".cyan(),
        "                       Write a settings file".dimmed()
    );
    println!();

    let sources: Vec<_> = quarry_core::federated::Source::ALL
        .iter()
        .map(|s| s.as_str().cyan().to_string())
        .collect();
    println!("{} {}", "Sources:".bold().green(), sources.join(", "));
    println!();

    println!(
        "{} Use {} for full help",
        "Tip:".dimmed(),
        "quarry --help".cyan()
    );
    println!();

    Ok(())
}
