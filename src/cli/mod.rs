use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pocat")]
#[command(author, version, about = "PO translation catalog engine with minimal-diff rewriting", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse catalogs and report entry statistics
    Check(CheckArgs),

    /// Rewrite catalogs with every field re-wrapped
    Normalize(NormalizeArgs),

    /// Show or set header fields of a catalog
    Header(HeaderArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., wrap.width)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Catalog files or directories containing catalogs
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Process subdirectories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Catalog files or directories containing catalogs
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Process subdirectories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Wrap column (overrides config)
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Split fields only at embedded newlines
    #[arg(long, default_value_t = false)]
    pub no_wrap: bool,

    /// Also break around block markup tags
    #[arg(long, default_value_t = false)]
    pub fine: bool,
}

#[derive(Parser, Debug)]
pub struct HeaderArgs {
    /// Catalog file
    #[arg(required = true)]
    pub file: PathBuf,

    /// Header field to show or set
    #[arg(short, long)]
    pub field: Option<String>,

    /// New value for the field
    #[arg(short, long, requires = "field")]
    pub set: Option<String>,
}
