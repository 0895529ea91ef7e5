//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::{ProcessStatus, ProcessType};

/// Process catalog client: browse, reorder and extend the process hierarchy
#[derive(Parser, Debug)]
#[command(name = "procat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Catalog API base url (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub api_url: Option<String>,

    /// Serve the catalog from a JSON fixture instead of the API
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub fixture: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the process hierarchy
    Tree {
        /// Department whose processes are listed (default: config)
        #[arg(short = 'D', long)]
        department: Option<String>,

        /// Only roots whose name contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Expand these processes (repeatable)
        #[arg(short, long = "expand", value_name = "ID")]
        expand: Vec<String>,

        /// Expand every process with children down to --depth
        #[arg(short, long)]
        all: bool,

        /// Depth opened by --all (default: config tree.expand_depth)
        #[arg(long, requires = "all")]
        depth: Option<usize>,

        /// Select a process; a collapsed process with children is opened
        #[arg(long, value_name = "ID")]
        select: Option<String>,
    },

    /// List the immediate children of a process
    Children {
        /// Parent process id
        parent: String,
    },

    /// Persist a new order of a process's children
    Reorder {
        /// Parent process id
        parent: String,

        /// Complete list of child ids in the new order
        #[arg(required = true, num_args = 1..)]
        children: Vec<String>,
    },

    /// Create a subprocess and show it under its parent
    Create {
        /// Parent process id
        #[arg(short, long)]
        parent: String,

        /// Name of the new process
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(short = 't', long = "type", value_enum, default_value_t = TypeArg::Manual)]
        process_type: TypeArg,

        #[arg(long, value_enum, default_value_t = StatusArg::Active)]
        status: StatusArg,

        /// Department id (default: inherited from the parent)
        #[arg(short = 'D', long)]
        department: Option<String>,
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
    /// Show effective configuration
    Show,
    /// Create the global config file from a template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file locations
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeArg {
    Manual,
    Systemic,
}

impl From<TypeArg> for ProcessType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Manual => ProcessType::Manual,
            TypeArg::Systemic => ProcessType::Systemic,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Active,
    InReview,
    Deprecated,
}

impl From<StatusArg> for ProcessStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => ProcessStatus::Active,
            StatusArg::InReview => ProcessStatus::InReview,
            StatusArg::Deprecated => ProcessStatus::Deprecated,
        }
    }
}
