//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Ask questions about your documents
#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ask questions about your documents",
    long_about = "Load documents into persistent vector collections and answer questions over them.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ docqa init\n  $ docqa ingest handbook docs/*.pdf docs/faq.md\n  $ docqa ask handbook \"How many vacation days do I get?\""
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .docqa directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Load files into a collection
    #[command(
        about = "Load, split and embed files into a collection",
        after_help = "Supported: .txt .pdf .docx .csv .html .md\n\nExamples:\n  docqa ingest handbook handbook.pdf\n  docqa ingest notes \"notes/**/*.md\""
    )]
    Ingest {
        /// Collection name
        collection: String,

        /// Files or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Add files to an existing collection
    #[command(
        about = "Add files to an existing collection",
        after_help = "Example:\n  docqa add handbook addendum.docx"
    )]
    Add {
        /// Collection name
        collection: String,

        /// Files or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Answer a question from a collection
    #[command(
        about = "Answer a question using a collection as context",
        after_help = "Examples:\n  docqa ask handbook \"Who approves expenses?\"\n  docqa ask handbook \"Summarise the travel policy\" --search-type mmr --k 8"
    )]
    Ask {
        /// Collection name
        collection: String,

        /// The question
        question: String,

        /// Number of context chunks (default from settings)
        #[arg(short, long)]
        k: Option<usize>,

        /// similarity, mmr or similarity_score_threshold (default from settings)
        #[arg(long)]
        search_type: Option<String>,

        /// Also print the retrieved context
        #[arg(long)]
        show_context: bool,
    },

    /// Retrieve chunks without asking the model
    #[command(
        about = "Show the chunks most similar to a query",
        after_help = "Example:\n  docqa search handbook \"parental leave\" --k 3 --json"
    )]
    Search {
        /// Collection name
        collection: String,

        /// Query text
        query: String,

        /// Number of results
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List collections
    #[command(about = "List all collections in the store")]
    Collections {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show collection statistics
    #[command(about = "Show statistics for a collection")]
    Stats {
        /// Collection name
        collection: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete a collection
    #[command(about = "Delete a collection with all its chunks")]
    Delete {
        /// Collection name
        collection: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "docqa", "ask", "handbook", "who?", "--k", "3", "--search-type", "mmr",
        ]);
        match cli.command {
            Commands::Ask {
                collection,
                question,
                k,
                search_type,
                show_context,
            } => {
                assert_eq!(collection, "handbook");
                assert_eq!(question, "who?");
                assert_eq!(k, Some(3));
                assert_eq!(search_type.as_deref(), Some("mmr"));
                assert!(!show_context);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["docqa", "ingest", "handbook"]).is_err());

        let cli = Cli::try_parse_from(["docqa", "--config", "x.toml", "ingest", "h", "a.txt", "b.md"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Ingest { ref files, .. } if files.len() == 2));
    }
}
