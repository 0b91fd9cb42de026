pub mod cli;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jsonconf")]
#[command(about = "Inspect and edit JSON config files backed by default values")]
pub struct CliConfig {
    /// Config file to open (generated from the defaults if missing)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// JSON file holding the default values
    #[arg(short, long)]
    pub defaults: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Also write log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the whole config
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Print the defaults instead of the config
        #[arg(long)]
        from_defaults: bool,
    },
    /// Print one value
    Get {
        key: String,

        /// Convert the value to a registered type (see `types`)
        #[arg(long = "as")]
        as_type: Option<String>,

        /// Fall back to the default value when the key is unset
        #[arg(long)]
        fallback: bool,
    },
    /// Store a value and save the file; VALUE is parsed as JSON, else kept as text
    Set { key: String, value: String },
    /// Delete the config file so it is regenerated on the next run
    Reset,
    /// List the value types usable with `get --as`
    Types,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("config", &self.config)?;

        if let Some(defaults) = &self.defaults {
            validate_path("defaults", defaults)?;
        }

        if let Some(log_file) = &self.log_file {
            validate_path("log_file", log_file)?;
        }

        match &self.command {
            Command::Get { key, .. } | Command::Set { key, .. } => {
                validate_non_empty_string("key", key)
            }
            Command::Show { .. } | Command::Reset | Command::Types => Ok(()),
        }
    }
}
