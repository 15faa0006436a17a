//! Binary entry point: load config, wire the composition root, serve the
//! indexing/search HTTP API over `actix-web`.

use actix_web::{web, App, HttpServer};
use lumen_search::config::Config;
use lumen_search::http;
use lumen_search::lifecycle;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    lifecycle::init_logging();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&config_path)?;
    let bind_address = config.bind_address.clone();

    let state = web::Data::new(lifecycle::setup(config).await?);

    tracing::info!(address = %bind_address, "starting search engine server");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(http::configure))
        .bind(bind_address.as_str())?
        .run()
        .await?;

    Ok(())
}
