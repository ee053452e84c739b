use sqlx::SqlitePool;
use teloxide::{prelude::*, types::Message, utils::command::BotCommands};

use crate::services::ListSettings;

pub mod admin;
pub mod inventory;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), Error>;

#[derive(BotCommands, Debug, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Display help information about available commands.")]
    Help,
    #[command(
        description = "List medicines: q=<text>&filter=<near_expiry|expired|out_of_stock|low_stock>&category=<name>&administration=<oral|inj|topical|inhal>&count=<tablet|capsule|ampoule|vial|bottle|tube>&expires=<today|past_7_days|this_month|this_year>&sort=<name|category|quantity|expiration_date>&dir=<asc|desc>&page=<n>"
    )]
    Inventory(String),
    #[command(description = "List categories with their medicine counts.")]
    Categories,
    #[command(description = "Show one medicine: /show <id>")]
    Show(String),
    #[command(
        description = "Add a medicine: name=..&composition=..&category=..&threshold=..&expires=YYYY-MM-DD[&quantity=..&administration=..&count=..&remarks=..]"
    )]
    Add(String),
    #[command(description = "Edit a medicine: /update <id> key=value&...")]
    Update(String),
    #[command(description = "Delete a medicine: /delete <id>")]
    Delete(String),
    #[command(description = "Mark medicines as out of stock: /outofstock <id> [id ...]")]
    OutOfStock(String),
}

/// Handles bot commands and responds accordingly.
pub async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    pool: SqlitePool,
    settings: ListSettings,
) -> HandlerResult {
    log::info!("Received command {:?}", cmd);

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Inventory(args) => {
            inventory::list_inventory(bot, msg, pool, settings, args).await?;
        }
        Command::Categories => admin::list_categories(bot, msg, pool).await?,
        Command::Show(args) => admin::show_medicine(bot, msg, pool, args).await?,
        Command::Add(args) => admin::add_medicine(bot, msg, pool, args).await?,
        Command::Update(args) => admin::update_medicine(bot, msg, pool, args).await?,
        Command::Delete(args) => admin::delete_medicine(bot, msg, pool, args).await?,
        Command::OutOfStock(args) => admin::mark_out_of_stock(bot, msg, pool, args).await?,
    };

    Ok(())
}

/// Handles any message that is not a known command.
pub async fn handle_message(bot: Bot, msg: Message) -> HandlerResult {
    if msg.text().is_some() {
        bot.send_message(
            msg.chat.id,
            "I don't understand that command. Type /help for available commands.",
        )
        .await?;
    }
    Ok(())
}
