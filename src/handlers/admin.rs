use sqlx::SqlitePool;
use teloxide::{prelude::*, types::Message};

use chrono::NaiveDate;

use crate::db::models::{ExpiryStatus, Medicine};
use crate::handlers::HandlerResult;
use crate::services::admin::{self, AdminError, MedicineForm};
use crate::services::query::MedicineQuery;
use crate::utils::{format_date, today};

pub async fn show_medicine(bot: Bot, msg: Message, pool: SqlitePool, args: String) -> HandlerResult {
    let Some(id) = parse_id(&args) else {
        bot.send_message(msg.chat.id, "Usage: /show <id>").await?;
        return Ok(());
    };

    let reply = match admin::get_medicine(&pool, id).await {
        Ok(medicine) => describe(&medicine, today()),
        Err(e) => failure_reply("load", &e),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn add_medicine(bot: Bot, msg: Message, pool: SqlitePool, args: String) -> HandlerResult {
    let input = match MedicineForm::parse(&args).and_then(|form| form.into_new_medicine(None)) {
        Ok(input) => input,
        Err(e) => {
            log::warn!("Rejected new medicine: {}", e);
            bot.send_message(msg.chat.id, format!("Invalid medicine: {}", e))
                .await?;
            return Ok(());
        }
    };

    let reply = match admin::create_medicine(&pool, &input).await {
        Ok(medicine) => format!("Added:\n\n{}", describe(&medicine, today())),
        Err(e) => failure_reply("add", &e),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// `/update <id> key=value&...`: fields not given keep their current values.
pub async fn update_medicine(
    bot: Bot,
    msg: Message,
    pool: SqlitePool,
    args: String,
) -> HandlerResult {
    let usage = "Usage: /update <id> key=value&...";
    let Some((id, form)) = args.trim().split_once(char::is_whitespace) else {
        bot.send_message(msg.chat.id, usage).await?;
        return Ok(());
    };
    let Some(id) = parse_id(id) else {
        bot.send_message(msg.chat.id, usage).await?;
        return Ok(());
    };

    let reply = match apply_update(&pool, id, form).await {
        Ok(medicine) => format!("Updated:\n\n{}", describe(&medicine, today())),
        Err(e) => failure_reply("update", &e),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn apply_update(pool: &SqlitePool, id: i64, form: &str) -> Result<Medicine, AdminError> {
    let form = MedicineForm::parse(form)?;
    let current = admin::get_medicine(pool, id).await?;
    let input = form.into_new_medicine(Some(&current))?;
    admin::update_medicine(pool, id, &input).await
}

pub async fn delete_medicine(
    bot: Bot,
    msg: Message,
    pool: SqlitePool,
    args: String,
) -> HandlerResult {
    let Some(id) = parse_id(&args) else {
        bot.send_message(msg.chat.id, "Usage: /delete <id>").await?;
        return Ok(());
    };

    let reply = match admin::delete_medicine(&pool, id).await {
        Ok(()) => format!("Deleted medicine {}", id),
        Err(e) => failure_reply("delete", &e),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// `/outofstock 3 7 12`: zeroes the quantity of every listed medicine, or of
/// none if any id is wrong.
pub async fn mark_out_of_stock(
    bot: Bot,
    msg: Message,
    pool: SqlitePool,
    args: String,
) -> HandlerResult {
    let ids = match parse_ids(&args) {
        Ok(ids) if !ids.is_empty() => ids,
        Ok(_) => {
            bot.send_message(msg.chat.id, "Usage: /outofstock <id> [id ...]")
                .await?;
            return Ok(());
        }
        Err(token) => {
            bot.send_message(msg.chat.id, format!("`{}` is not a medicine id", token))
                .await?;
            return Ok(());
        }
    };

    let reply = match admin::mark_out_of_stock(&pool, &ids).await {
        Ok(count) => format!("Marked {} medicines as out of stock", count),
        Err(e) => format!("{}. No medicine was changed.", failure_reply("update", &e)),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// `/categories`: every category with its count and a ready-made
/// `/inventory` selector.
pub async fn list_categories(bot: Bot, msg: Message, pool: SqlitePool) -> HandlerResult {
    let reply = match admin::category_counts(&pool).await {
        Ok(counts) => render_categories(&counts, today()),
        Err(e) => failure_reply("list", &e),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

fn render_categories(counts: &[(String, i64)], today: NaiveDate) -> String {
    if counts.is_empty() {
        return "No medicines yet.".to_string();
    }
    counts
        .iter()
        .map(|(category, count)| {
            let selector = MedicineQuery::new(today)
                .with_category(category.as_str())
                .to_query_string();
            format!("{} ({}): /inventory {}", category, count, selector)
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn parse_id(input: &str) -> Option<i64> {
    input.trim().trim_start_matches('#').parse().ok()
}

/// Ids separated by whitespace and/or commas. Returns the first bad token.
pub fn parse_ids(input: &str) -> Result<Vec<i64>, String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| parse_id(token).ok_or_else(|| token.to_string()))
        .collect()
}

fn failure_reply(action: &str, err: &AdminError) -> String {
    match err {
        AdminError::Database(e) => {
            log::error!("Failed to {} medicine: {}", action, e);
            format!("Failed to {} medicine", action)
        }
        other => {
            log::warn!("Could not {} medicine: {}", action, other);
            other.to_string()
        }
    }
}

pub fn describe(medicine: &Medicine, today: NaiveDate) -> String {
    let status = match medicine.status_on(today) {
        ExpiryStatus::Expired => " (expired)",
        ExpiryStatus::NearExpiry => " (near expiry)",
        ExpiryStatus::InDate => "",
    };
    let mut lines = vec![
        format!("#{} {}", medicine.id, medicine),
        format!("Category: {}", medicine.category),
        format!("Administration: {}", medicine.administration_type.label()),
        format!(
            "Stock: {} {} (low-stock threshold {})",
            medicine.quantity,
            medicine.count_type.code(),
            medicine.low_stock_threshold
        ),
        format!("Expires: {}{}", format_date(medicine.expiration_date), status),
    ];
    if let Some(remarks) = &medicine.remarks {
        lines.push(format!("Remarks: {}", remarks));
    }
    lines.push(format!(
        "Updated: {}",
        medicine.updated_at.format("%d-%m-%Y %H:%M")
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_separated_by_commas_and_spaces() {
        assert_eq!(parse_ids("3, 7 12,#4"), Ok(vec![3, 7, 12, 4]));
        assert_eq!(parse_ids("   "), Ok(vec![]));
        assert_eq!(parse_ids("3 seven"), Err("seven".to_string()));
    }

    #[test]
    fn failure_reply_hides_database_details() {
        let not_found = failure_reply("update", &AdminError::NotFound(9));
        assert_eq!(not_found, "Medicine 9 not found");

        let db = AdminError::Database(crate::db::DatabaseError::Sqlx(sqlx::Error::PoolClosed));
        assert_eq!(failure_reply("delete", &db), "Failed to delete medicine");
    }

    fn medicine(category: &str, expires: NaiveDate) -> Medicine {
        let stamp = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        Medicine {
            id: 7,
            name: "Ceftriaxone".to_string(),
            composition: "Ceftriaxone 1g".to_string(),
            administration_type: crate::db::models::AdministrationType::Injection,
            category: category.to_string(),
            count_type: crate::db::models::CountType::Vial,
            quantity: 12,
            low_stock_threshold: 4,
            expiration_date: expires,
            remarks: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn describe_flags_expiry_status() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let expired = describe(&medicine("Antibiotic", NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()), today);
        assert!(expired.contains("Expires: 28-02-2026 (expired)"));
        assert!(expired.contains("Administration: Injection"));

        let near = describe(&medicine("Antibiotic", today), today);
        assert!(near.contains("Expires: 01-03-2026 (near expiry)"));

        let in_date = describe(&medicine("Antibiotic", NaiveDate::from_ymd_opt(2027, 3, 1).unwrap()), today);
        assert!(in_date.contains("Expires: 01-03-2027\n"));
    }

    #[test]
    fn categories_link_to_their_selector() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let counts = vec![("Antibiotic".to_string(), 3), ("Vitamin D".to_string(), 1)];

        assert_eq!(
            render_categories(&counts, today),
            "Antibiotic (3): /inventory category=Antibiotic&sort=name&dir=asc\n\
             Vitamin D (1): /inventory category=Vitamin+D&sort=name&dir=asc"
        );
        assert_eq!(render_categories(&[], today), "No medicines yet.");
    }
}
