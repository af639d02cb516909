//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Derive crafting recipes and tech trees from game content
#[derive(Parser, Debug)]
#[command(name = "crafttree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export object documents and the index as JSON
    Process {
        /// Content directory (objects/, categories/, transitions.json)
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
        /// Output directory (default: output_dir setting)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: Option<PathBuf>,
        /// Git checkout for version tags (default: git_dir setting or data_dir)
        #[arg(long, value_hint = ValueHint::DirPath)]
        git_dir: Option<PathBuf>,
    },

    /// Print the recipe document of an object
    Recipe {
        /// Content directory
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
        /// Object id
        id: String,
    },

    /// Print the recipe of an object as a tree
    Tree {
        /// Content directory
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
        /// Object id
        id: String,
    },

    /// Print the tech-tree preview of an object
    TechTree {
        /// Content directory
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
        /// Object id
        id: String,
        /// Preview depth (default: tech_tree_depth setting)
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Show content summary
    Info {
        /// Content directory
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Content directory whose local config is merged
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },

    /// Create config file
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Content directory for the local config
        #[arg(value_hint = ValueHint::DirPath, required_unless_present = "global")]
        data_dir: Option<PathBuf>,
    },

    /// Show config paths
    Path {
        /// Content directory
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },

    /// Print a commented config template
    Template,
}
