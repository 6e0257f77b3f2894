use std::path::PathBuf;

use clap::Parser;
use restaurant_finder::{
    db::DocumentStore,
    loader::{self, LoadReport},
};

/// Insert every restaurant of a JSON array file into the document store.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// JSON file holding an array of restaurants
    #[arg(short, long, default_value = "restaurants.json")]
    file: PathBuf,

    #[arg(short, long, default_value = loader::DEFAULT_COLLECTION)]
    collection: String,

    /// e.g. sqlite://restaurants.db
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    restaurant_finder::logging::init()?;

    let args = Args::parse();
    match run(&args).await {
        Ok(report) => {
            tracing::info!("{report}");
            println!("{report}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Error: {e:#}");
            Err(e)
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<LoadReport> {
    let store = DocumentStore::connect(&args.database_url).await?;
    let result = loader::load(&store, &args.collection, &args.file).await;
    store.close().await;
    result
}
