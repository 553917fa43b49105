use anyhow::{bail, Context, Result};
use clap::Parser;
use dataintel_rs::{Client, ClientConfig, SearchQuery};
use serde::Serialize;
use std::path::Path;

mod cli;
mod telemetry;

use cli::{Cli, CollectionCommand, Commands, Credentials, PipelineCommand, ResourceCommand};

const DEFAULT_CONFIG: &str = "dataintel.json";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = telemetry::init_telemetry(cli.log_dir.as_deref(), cli.verbose)?;

    let config = resolve_config(
        cli.config.as_deref(),
        cli.uri.as_deref(),
        Path::new(DEFAULT_CONFIG),
    )?;
    let (username, password) = credentials(&cli.credentials)?;

    tracing::debug!(
        uri = %config.uri,
        timeout_secs = config.timeout_secs,
        max_attempts = config.retry.max_attempts,
        "configuration loaded"
    );

    let client = Client::login(&config, username, password)
        .await
        .with_context(|| format!("login to {} failed", config.uri))?;

    match cli.command {
        Commands::Login => {
            print_json(&serde_json::json!({
                "uri": client.session().uri(),
                "username": client.session().username(),
                "token": client.session().token(),
            }))?;
        }
        Commands::Collections(cmd) => {
            let api = client.collections();
            match cmd {
                CollectionCommand::List => print_json(&api.get_collections().await?)?,
                CollectionCommand::Get { name } => print_json(&api.get_collection(&name).await?)?,
            }
        }
        Commands::Pipelines(cmd) => {
            let api = client.pipelines();
            match cmd {
                PipelineCommand::List => print_json(&api.get_pipelines().await?)?,
                PipelineCommand::Get { name } => print_json(&api.get_pipeline(&name).await?)?,
                PipelineCommand::Delete { name } => {
                    let deleted = api.delete_pipeline(&name).await?;
                    tracing::info!(pipeline = %name, status = %deleted.status, "pipeline deleted");
                    print_json(&deleted)?;
                }
            }
        }
        Commands::Schemas(cmd) => {
            let api = client.schemas();
            match cmd {
                ResourceCommand::List => print_json(&api.get_schemas().await?)?,
                ResourceCommand::Get { name } => print_json(&api.get_schema(&name).await?)?,
            }
        }
        Commands::Models(cmd) => {
            let api = client.models();
            match cmd {
                ResourceCommand::List => print_json(&api.get_models().await?)?,
                ResourceCommand::Get { name } => print_json(&api.get_model(&name).await?)?,
            }
        }
        Commands::Search(args) => {
            let query = SearchQuery::new(
                args.collection,
                args.query,
                args.access_key,
                args.secret_key,
                args.top_k,
            );
            let results = client.search().search(&query).await?;
            tracing::info!(hits = results.len(), "search complete");
            print_json(&results)?;
        }
    }

    Ok(())
}

/// Load the configuration file (explicit path, else `default_path` when
/// present) and apply a `--uri` override.
fn resolve_config(
    path: Option<&Path>,
    uri: Option<&str>,
    default_path: &Path,
) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(&path.to_string_lossy())
            .with_context(|| format!("failed to load {}", path.display()))?,
        None if default_path.exists() => ClientConfig::load(&default_path.to_string_lossy())
            .with_context(|| format!("failed to load {}", default_path.display()))?,
        None => match uri {
            Some(uri) => ClientConfig::new(uri),
            None => bail!("no service URI: pass --uri or provide {}", default_path.display()),
        },
    };

    if let Some(uri) = uri {
        config.uri = uri.to_string();
    }
    Ok(config)
}

fn credentials(credentials: &Credentials) -> Result<(&str, &str)> {
    let username = credentials
        .username
        .as_deref()
        .context("missing username: pass --username or set DATAINTEL_USERNAME")?;
    let password = credentials
        .password
        .as_deref()
        .context("missing password: pass --password or set DATAINTEL_PASSWORD")?;
    Ok((username, password))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
