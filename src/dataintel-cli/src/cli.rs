//! Command-line arguments for the `dataintel` binary

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// DataIntel CLI - query a DataIntel service from the shell
///
/// Every command logs in first, runs one API call and prints the result as
/// pretty JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "dataintel", version, about, long_about = None)]
pub struct Cli {
    /// Path to the client configuration file
    #[arg(short, long, global = true, env = "DATAINTEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service URI, overrides the configuration file
    #[arg(short, long, global = true, env = "DATAINTEL_URI")]
    pub uri: Option<String>,

    /// Write JSON logs to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub credentials: Credentials,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct Credentials {
    #[arg(long, global = true, env = "DATAINTEL_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "DATAINTEL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and print the session token
    Login,

    /// Inspect collections
    #[command(subcommand)]
    Collections(CollectionCommand),

    /// Inspect or delete pipelines
    #[command(subcommand)]
    Pipelines(PipelineCommand),

    /// Inspect schemas
    #[command(subcommand)]
    Schemas(ResourceCommand),

    /// Inspect embedding models
    #[command(subcommand)]
    Models(ResourceCommand),

    /// Run a similarity search against a collection
    Search(SearchArgs),
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    List,
    Get { name: String },
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    List,
    Get { name: String },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    List,
    Get { name: String },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Collection to search
    #[arg(long)]
    pub collection: String,

    /// Free-text query
    pub query: String,

    /// Number of results to return
    #[arg(long, default_value_t = 5)]
    pub top_k: u32,

    #[arg(long, env = "DATAINTEL_ACCESS_KEY")]
    pub access_key: String,

    #[arg(long, env = "DATAINTEL_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,
}
