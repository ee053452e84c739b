use sqlx::SqlitePool;
use teloxide::{prelude::*, types::Message, types::ParseMode};

use crate::db::models::{ExpiryStatus, Medicine};
use crate::handlers::HandlerResult;
use crate::services::query::{ListParams, MedicinePage, SortField};
use crate::services::store::SqliteStore;
use crate::services::{self, ListSettings};
use crate::utils::{escape_markdown, format_date, today};

/// Telegram's cap on the text of one message, in UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;

/// Lists the inventory for the `/inventory` command.
///
/// `args` is either a query string (`q=..&filter=..&sort=..&dir=..&page=..`)
/// or plain search text.
pub async fn list_inventory(
    bot: Bot,
    msg: Message,
    pool: SqlitePool,
    settings: ListSettings,
    args: String,
) -> HandlerResult {
    let params = parse_list_args(&args);
    log::info!("Listing inventory with {:?}", params);

    let store = SqliteStore::new(pool);
    let page = match services::list_medicines(&store, &params, settings, today()).await {
        Ok(page) => page,
        Err(e) => {
            log::error!("Failed to list inventory: {}", e);
            bot.send_message(msg.chat.id, "Failed to load the inventory")
                .await?;
            return Ok(());
        }
    };

    for text in render_page(&page) {
        bot.send_message(msg.chat.id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
    }

    Ok(())
}

pub fn parse_list_args(args: &str) -> ListParams {
    let args = args.trim();
    if args.contains('=') {
        ListParams::from_query_string(args)
    } else if args.is_empty() {
        ListParams::default()
    } else {
        ListParams {
            q: Some(args.to_string()),
            ..ListParams::default()
        }
    }
}

/// Renders a result page as MarkdownV2 messages, with copyable follow-up
/// commands in the last one.
///
/// Each message stays within [`MESSAGE_LIMIT`]. Medicines are never split
/// across messages.
pub fn render_page(page: &MedicinePage) -> Vec<String> {
    let mut sections = Vec::new();

    if page.items.is_empty() {
        let message = if page.total == 0 {
            "No medicines match your query.".to_string()
        } else {
            format!(
                "Page {} is past the end: {} medicines over {} pages.",
                page.page,
                page.total,
                page.num_pages()
            )
        };
        sections.push(escape_markdown(&message));
    } else {
        let first = page.query.offset(page.page_size) + 1;
        let last = first + page.items.len() as i64 - 1;
        sections.push(format!(
            "*Medicines* {}",
            escape_markdown(&format!(
                "{}-{} of {} (page {}/{})",
                first,
                last,
                page.total,
                page.page,
                page.num_pages()
            ))
        ));

        sections.extend(
            page.items
                .iter()
                .map(|medicine| render_medicine(medicine, page)),
        );
    }

    let mut links = Vec::new();
    if let Some(previous) = page.previous_link() {
        links.push(format!("Previous: `/inventory {}`", previous));
    }
    if let Some(next) = page.next_link() {
        links.push(format!("Next: `/inventory {}`", next));
    }
    for field in [
        SortField::Name,
        SortField::Category,
        SortField::Quantity,
        SortField::ExpirationDate,
    ] {
        links.push(format!(
            "Sort by {}: `/inventory {}`",
            escape_markdown(field.as_str()),
            page.query.sort_link(field)
        ));
    }
    sections.push(links.join("\n"));

    pack_messages(sections, MESSAGE_LIMIT)
}

fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Packs sections, in order, into as few messages as fit `limit`, separating
/// sections with a blank line.
fn pack_messages(sections: Vec<String>, limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();

    for section in sections.iter().flat_map(|section| split_oversized(section, limit)) {
        if current.is_empty() {
            current = section;
        } else if text_len(&current) + 2 + text_len(&section) <= limit {
            current.push_str("\n\n");
            current.push_str(&section);
        } else {
            messages.push(std::mem::replace(&mut current, section));
        }
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

/// Splits a section longer than `limit` on line breaks, and any single line
/// still too long at character boundaries.
fn split_oversized(section: &str, limit: usize) -> Vec<String> {
    if text_len(section) <= limit {
        return vec![section.to_string()];
    }

    let mut pieces = Vec::new();
    for line in section.lines() {
        if text_len(line) <= limit {
            pieces.push(line.to_string());
            continue;
        }
        let mut piece = String::new();
        let mut piece_len = 0;
        for c in line.chars() {
            if piece_len + c.len_utf16() > limit {
                pieces.push(std::mem::take(&mut piece));
                piece_len = 0;
            }
            piece.push(c);
            piece_len += c.len_utf16();
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
    }
    pieces
}

fn render_medicine(medicine: &Medicine, page: &MedicinePage) -> String {
    let expiry = match medicine.status_on(page.query.today) {
        ExpiryStatus::Expired => " ⛔ expired",
        ExpiryStatus::NearExpiry => " ⚠️ near expiry",
        ExpiryStatus::InDate => "",
    };

    let stock = if medicine.is_out_of_stock() {
        " ⛔ out of stock"
    } else if medicine.is_low_stock() {
        " ⚠️ low stock"
    } else {
        ""
    };

    let details = format!(
        "#{} | {} | {}\n   Stock: {} {} (threshold {}){}\n   Expires: {}{}",
        medicine.id,
        medicine.category,
        medicine.administration_type.label(),
        medicine.quantity,
        medicine.count_type.code(),
        medicine.low_stock_threshold,
        stock,
        format_date(medicine.expiration_date),
        expiry,
    );

    format!(
        "🏥 *{}* {}\n   {}",
        escape_markdown(&medicine.name),
        escape_markdown(&format!("({})", medicine.composition)),
        escape_markdown(&details)
    )
}
