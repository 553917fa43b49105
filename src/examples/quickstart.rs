//! Quickstart Example
//!
//! Logs in, lists collections and pipelines, then runs a similarity search
//! against the first collection.
//!
//! Run with:
//!   DATAINTEL_URI=https://dataintel.example.com \
//!   DATAINTEL_USERNAME=user DATAINTEL_PASSWORD=secret \
//!   cargo run --example quickstart

use dataintel_rs::{Client, ClientConfig, SearchQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let uri = std::env::var("DATAINTEL_URI")?;
    let username = std::env::var("DATAINTEL_USERNAME")?;
    let password = std::env::var("DATAINTEL_PASSWORD")?;

    let config = ClientConfig::new(uri);
    let client = Client::login(&config, &username, &password).await?;
    println!("Logged in to {} as {}\n", client.session().uri(), username);

    let collections = client.collections().get_collections().await?;
    println!("Collections:");
    for collection in collections.iter() {
        println!("   {} ({})", collection.name, collection.id);
    }

    let pipelines = client.pipelines().get_pipelines().await?;
    println!("\nPipelines:");
    for pipeline in pipelines.iter() {
        println!("   {}", pipeline.name);
    }

    // Searching needs the bucket keys of the collection's storage
    let (Some(first), Ok(access_key), Ok(secret_key)) = (
        collections.first(),
        std::env::var("DATAINTEL_ACCESS_KEY"),
        std::env::var("DATAINTEL_SECRET_KEY"),
    ) else {
        return Ok(());
    };

    let query = SearchQuery::new(&first.name, "quarterly revenue", access_key, secret_key, 5);
    let results = client.search().search(&query).await?;
    println!("\nSearch results in '{}':", first.name);
    for (i, result) in results.iter().enumerate() {
        println!("   {}. {} (score: {:.4})", i + 1, result.data_chunk, result.score);
    }

    Ok(())
}
