use dotenvy::dotenv;
use envconfig::Envconfig;
use teloxide::{dispatching::Dispatcher, prelude::*};

use medstock::config::Config;
use medstock::db;
use medstock::handlers::{answer, handle_message, Command, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting the medicine inventory bot...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    let config = Config::init_from_env()?;
    let settings = config.list_settings();

    let pool = db::init_db(&config.database_url).await?;

    let bot = Bot::new(config.telegram_bot_token);

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(answer))
        .branch(dptree::endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pool, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down gracefully");
    Ok(())
}
