use std::sync::Arc;

use anyhow::Context;
use restaurant_finder::{bot::App, client::ApiClient, config::ClientConfig};
use teloxide::{
    dptree,
    prelude::{Dispatcher, LoggingErrorHandler},
    Bot,
};

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    restaurant_finder::logging::init()?;

    let config = ClientConfig::from_env()?;
    tracing::info!("searching restaurants through {}", config.api_url);
    let app = Arc::new(App::new(ApiClient::new(&config)?));

    let token = std::env::var("TGBOT_TOKEN").context("TGBOT_TOKEN env not found")?;
    let bot = Bot::new(token);

    Dispatcher::builder(bot, handlers::handler_schema())
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .default_handler(|_| async move {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error occur when handling update",
        ))
        .build()
        .dispatch()
        .await;

    Ok(())
}
