use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Current calendar day in UTC, the reference day for expiry checks.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Current UTC timestamp used for `created_at`/`updated_at`.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Helper function to format the date
///
/// This function takes a `NaiveDate` and formats it as a string in the "dd-mm-yyyy" format.
///
/// # Arguments
///
/// * `date` - A `NaiveDate` object representing the date to be formatted
///
/// # Returns
///
/// A `String` containing the formatted date
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Helper function to escape special characters for Telegram MarkdownV2
///
/// Every character with special meaning in MarkdownV2, including the
/// backslash itself, is prefixed with a backslash so it is rendered as
/// literal text.
///
/// # Arguments
///
/// * `text` - A string slice containing the text to be escaped
///
/// # Returns
///
/// A `String` with all MarkdownV2 special characters escaped
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "_*[]()~`>#+-=|{}.!\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_day_first() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(format_date(date), "09-01-2026");
    }

    #[test]
    fn escapes_markdown_special_characters() {
        assert_eq!(escape_markdown("Paracetamol 500mg"), "Paracetamol 500mg");
        assert_eq!(
            escape_markdown("Co-amoxiclav (625mg)."),
            "Co\\-amoxiclav \\(625mg\\)\\."
        );
        assert_eq!(escape_markdown("q=a&sort=name"), "q\\=a&sort\\=name");
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }
}
