//! Rendering deadlines into chat text.

use chrono::NaiveDateTime;

use duebot_types::DeadlineRecord;

use crate::occurrence::effective_dates;

const SEPARATOR: &str = "━━━━━━━━━━━━━━━";
const STAMP_FORMAT: &str = "%b %d, %I:%M %p";

/// Render one resolved entry: name (with a recurrence marker when
/// applicable), start, due, then the optional link.
pub fn format_entry(
    name: &str,
    start: NaiveDateTime,
    due: NaiveDateTime,
    link: Option<&str>,
    recurring: bool,
) -> String {
    let mut line = format!("  📝 {name}");
    if recurring {
        line.push_str(" 🔁");
    }
    line.push_str(&format!(
        "\n  🟢 {}\n  🔴 {}",
        start.format(STAMP_FORMAT),
        due.format(STAMP_FORMAT)
    ));
    if let Some(link) = link {
        line.push_str(&format!("\n  🔗 {link}"));
    }
    line
}

/// Render one resolved entry with its identifier prefixed.
pub fn format_entry_with_id(
    id: i64,
    name: &str,
    start: NaiveDateTime,
    due: NaiveDateTime,
    link: Option<&str>,
    recurring: bool,
) -> String {
    format!("ID: {id}\n{}", format_entry(name, start, due, link, recurring))
}

/// Render records grouped by class label.
///
/// Classes appear in first-seen order (case-sensitive) and entries keep
/// their incoming relative order within a class. Each group gets a header
/// and a trailing separator; the separator after the last group is
/// stripped. An empty record set renders as an empty string.
pub fn format_grouped(records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    let mut classes: Vec<&str> = Vec::new();
    for record in records {
        if !classes.contains(&record.class_name.as_str()) {
            classes.push(&record.class_name);
        }
    }

    let mut lines: Vec<String> = Vec::new();
    for class in classes {
        lines.push(format!("📚 {class}\n"));
        for record in records.iter().filter(|r| r.class_name == class) {
            let (start, due) = effective_dates(record, now);
            lines.push(format_entry(
                &record.name,
                start,
                due,
                record.link.as_deref(),
                record.recurring.is_some(),
            ));
            lines.push(String::new());
        }
        lines.push(format!("{SEPARATOR}\n"));
    }
    lines.pop(); // trailing separator
    lines.join("\n")
}

/// Render records flat with identifier prefixes, in incoming order.
/// An empty record set renders as an empty string.
pub fn format_with_ids(records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Deadlines with IDs:\n".to_string()];
    for record in records {
        let (start, due) = effective_dates(record, now);
        lines.push(format_entry_with_id(
            record.id,
            &record.name,
            start,
            due,
            record.link.as_deref(),
            record.recurring.is_some(),
        ));
        lines.push(String::new());
    }
    lines.pop(); // trailing blank line
    lines.join("\n")
}
