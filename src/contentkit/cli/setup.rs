use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contentkit", bin_name = "contentkit", version)]
#[command(about = "Inspect and override managed content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to contentkit.toml
    #[arg(short, long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show an item's content parts
    Get {
        /// Item key (e.g. about, mail/welcome)
        key: String,

        /// Print a single part, raw
        #[arg(short, long)]
        field: Option<String>,
    },

    /// List all items
    #[command(alias = "ls")]
    List,

    /// Render a content part
    Render {
        key: String,

        field: String,

        /// Render variable, repeatable
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Render variables as a JSON object
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },

    /// Override one part of an item
    Set {
        key: String,

        field: String,

        value: String,

        /// Save even if the item fails validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Remove an item's override
    Reset { key: String },

    /// Show an item's meta-data
    Meta { key: String },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}
