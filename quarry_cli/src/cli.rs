use clap::{Parser, Subcommand, ValueEnum};
use quarry_core::federated::SourceSelection;
use quarry_core::llm::BackendKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry - turn a research note into a list of relevant papers")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  quarry collect notes/sleep.md               Analyse a note, search arXiv
  quarry collect notes/sleep.md -s all        ...and PubMed and Semantic Scholar
  quarry search \"rem sleep\" \"memory\"          Search without the model
  quarry interpret reply.txt --note note.md   Only parse a model reply

\x1b[1;36mConfiguration:\x1b[0m
  quarry config init                          Write default settings
  quarry config set llm.backend api           Use the hosted API backend
  quarry config show                          View current settings")]
#[command(long_about = "
\x1b[1mQuarry\x1b[0m - from research note to reading list

A language model reads your note and proposes search queries. Quarry runs
them against arXiv, PubMed and Semantic Scholar, merges the results and
drops duplicate titles.
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Settings file (defaults to <config dir>/quarry/settings.yaml)
    #[arg(long, global = true, env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a note with the model and search for papers
    ///
    /// The note is sent to the configured backend, which proposes topics,
    /// queries and trends. Each query is then run against the selected
    /// sources.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  quarry collect notes/sleep.md
  quarry collect notes/sleep.md --source pubmed --limit 5
  quarry collect - --title \"Scratch\" < draft.md
  quarry collect notes/sleep.md --append       Append results to the note
  quarry collect notes/sleep.md --output json")]
    Collect {
        /// Note file to analyse ("-" reads stdin)
        note: PathBuf,
        /// Title used in the report (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// arxiv, pubmed, semantic-scholar or all
        #[arg(short, long)]
        source: Option<SourceSelection>,
        /// Results requested per source per query
        #[arg(short, long)]
        limit: Option<u32>,
        /// Model backend: cli or api
        #[arg(short, long)]
        backend: Option<BackendKind>,
        /// Include abstracts in the output
        #[arg(short = 'a', long)]
        show_abstracts: bool,
        /// Append the Markdown report to the note file
        #[arg(long)]
        append: bool,
    },

    /// Run queries directly, without the model
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  quarry search \"graph neural networks\"
  quarry search \"crispr off-target\" \"base editing\" -s all -l 5")]
    Search {
        /// One or more queries, run in order
        #[arg(required = true)]
        queries: Vec<String>,
        /// arxiv, pubmed, semantic-scholar or all
        #[arg(short, long)]
        source: Option<SourceSelection>,
        /// Results requested per source per query
        #[arg(short, long)]
        limit: Option<u32>,
        /// Include abstracts in the output
        #[arg(short = 'a', long)]
        show_abstracts: bool,
    },

    /// Extract topics, queries and trends from a saved model reply
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  quarry interpret reply.txt
  quarry interpret reply.txt --note notes/sleep.md --output json")]
    Interpret {
        /// File holding the model's reply ("-" reads stdin)
        response: PathBuf,
        /// Original note, used for the fallback query
        #[arg(long)]
        note: Option<PathBuf>,
    },

    /// List the available sources
    #[command(alias = "ls")]
    Sources,

    /// View or edit settings
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  quarry config show
  quarry config path
  quarry config init
  quarry config set max_results 20
  quarry config set llm.api_key            Prompts without echo")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show current settings (secrets masked)
    Show,
    /// Print the settings file location
    Path,
    /// Write a settings file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single key, e.g. `llm.backend api`
    Set {
        /// Dotted key name
        key: String,
        /// New value (prompted for when omitted)
        value: Option<String>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Markdown output
    Markdown,
}
