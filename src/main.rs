use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use moviechat::catalog::Catalog;
use moviechat::chat::ChatService;
use moviechat::normalize::MovieNormalizer;
use moviechat::tmdb::TmdbClient;
use moviechat::{run_server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    let tmdb = TmdbClient::new(&config.tmdb)?;
    let normalizer = MovieNormalizer::new(
        config.tmdb.image_base_url.clone(),
        config.tmdb.site_base_url.clone(),
    );
    let catalog = Catalog::new(Arc::new(tmdb), normalizer);
    let chat = ChatService::new(catalog);

    run_server(config, chat).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
