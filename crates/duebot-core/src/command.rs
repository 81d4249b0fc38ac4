//! Chat command parsing and reply building.
//!
//! Reply builders here are pure: they take the parsed arguments, the
//! current record set, and an injected `now`, and return the outbound
//! text. The channel layer owns transport, admin identity, and store
//! access.

use chrono::NaiveDateTime;
use thiserror::Error;

use duebot_types::{DeadlineRecord, NewDeadline, Recurrence};

use crate::dateparse::parse_datetime_spec;
use crate::format::{format_entry, format_grouped, format_with_ids};
use crate::horizon::{filter_today, filter_within, upcoming};
use crate::occurrence::effective_dates;

/// How many entries `/upcoming` shows.
pub const UPCOMING_COUNT: usize = 3;

/// Fixed denial text for privileged commands.
pub const DENIED: &str = "Only the admin can do that.";

pub const START_TEXT: &str = "Hello! I track deadlines.";

pub const HELP_TEXT: &str = "Commands:\n\
    /add class | name | start | due | link (optional) | weekly (optional)\n\
    /list [class] — all deadlines, or one class\n\
    /delete id — remove a deadline\n\
    /today /week /month /soon — time-scoped listings\n\
    /upcoming — the next three deadlines";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Add(String),
    List(Option<String>),
    Delete(String),
    Today,
    Week,
    Month,
    Soon,
    Upcoming,
    TestNotify,
}

impl Command {
    /// Parse a message of the form `/cmd[@botname] [args]`. Returns None
    /// for non-commands and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let cmd = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "add" => Command::Add(args.to_string()),
            "list" => Command::List((!args.is_empty()).then(|| args.to_string())),
            "delete" => Command::Delete(args.to_string()),
            "today" => Command::Today,
            "week" => Command::Week,
            "month" => Command::Month,
            "soon" => Command::Soon,
            "upcoming" => Command::Upcoming,
            "testnotify" => Command::TestNotify,
            _ => return None,
        };
        Some(cmd)
    }

    /// Whether this command is restricted to the configured admin.
    pub fn is_privileged(&self) -> bool {
        match self {
            Command::Add(_) | Command::Delete(_) | Command::TestNotify => true,
            Command::List(Some(arg)) => arg == "id",
            _ => false,
        }
    }
}

/// Rejections for `/add`, each carrying its user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddError {
    #[error(
        "Format: /add class | name | start | due | link (optional) | weekly (optional)"
    )]
    Usage,
    #[error("Only 'weekly' recurring is supported.")]
    BadRecurrence,
    #[error("Couldn't understand start date.")]
    BadStart,
    #[error("Couldn't understand due date.")]
    BadDue,
}

/// Parse the pipe-delimited `/add` argument string.
pub fn parse_add(args: &str, now: NaiveDateTime) -> Result<NewDeadline, AddError> {
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(AddError::Usage);
    }

    let link = parts
        .get(4)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let recurring = match parts.get(5).filter(|s| !s.is_empty()) {
        Some(token) => Some(Recurrence::parse(token).ok_or(AddError::BadRecurrence)?),
        None => None,
    };
    let start = parse_datetime_spec(parts[2], now).map_err(|_| AddError::BadStart)?;
    let due = parse_datetime_spec(parts[3], now).map_err(|_| AddError::BadDue)?;

    Ok(NewDeadline {
        name: parts[1].to_string(),
        class_name: parts[0].to_string(),
        start,
        due,
        link,
        recurring,
    })
}

/// Acknowledgement text for a successful add.
pub fn add_ack(deadline: &NewDeadline) -> String {
    let mut msg = format!(
        "Got it ✓\n{} — {}\n🟢 {}\n🔴 {}",
        deadline.class_name,
        deadline.name,
        deadline.start.format("%b %d %I:%M %p"),
        deadline.due.format("%b %d %I:%M %p"),
    );
    if let Some(recurring) = deadline.recurring {
        msg.push_str(&format!("\n🔁 {}", recurring.as_str()));
    }
    msg
}

/// Rejections for `/delete`, each carrying its user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("Format: /delete id\n\nUse /list id to see IDs.")]
    Usage,
    #[error("ID must be a number.")]
    NotANumber,
}

/// Parse the `/delete` argument into an identifier.
pub fn parse_delete(args: &str) -> Result<i64, DeleteError> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Err(DeleteError::Usage);
    }
    trimmed.parse().map_err(|_| DeleteError::NotANumber)
}

pub const DELETED_TEXT: &str = "Deleted ✓";

/// Build the `/list` reply over the full record set. Admin gating for the
/// `id` argument happens before this is called.
pub fn list_reply(arg: Option<&str>, records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    if records.is_empty() {
        return "No deadlines 🎉".into();
    }
    match arg {
        None => format_grouped(records, now),
        Some("id") => format_with_ids(records, now),
        Some(class) => {
            let filtered: Vec<DeadlineRecord> = records
                .iter()
                .filter(|r| r.class_name.eq_ignore_ascii_case(class))
                .cloned()
                .collect();
            if filtered.is_empty() {
                format!("No deadlines for {class}")
            } else {
                format_grouped(&filtered, now)
            }
        }
    }
}

/// Horizon flavors used by the time-scoped commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Today,
    Week,
    Month,
}

impl Horizon {
    pub fn days(self) -> i64 {
        match self {
            Horizon::Today => 1,
            Horizon::Week => 7,
            Horizon::Month => 30,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Horizon::Today => "📅 Due today:",
            Horizon::Week => "📅 Due this week:",
            Horizon::Month => "📅 Due this month:",
        }
    }

    fn empty_text(self) -> &'static str {
        match self {
            Horizon::Today => "Nothing due today 🎉",
            Horizon::Week => "Nothing due this week 🎉",
            Horizon::Month => "Nothing due this month 🎉",
        }
    }
}

/// Build the reply for a time-scoped listing.
pub fn horizon_reply(horizon: Horizon, records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    let filtered = match horizon {
        Horizon::Today => filter_today(records, now),
        Horizon::Week | Horizon::Month => filter_within(records, now, horizon.days()),
    };
    if filtered.is_empty() {
        return horizon.empty_text().to_string();
    }
    format!("{}\n\n{}", horizon.header(), format_grouped(&filtered, now))
}

/// Build the `/upcoming` reply: the nearest future deadlines, flat and
/// sorted by effective due.
pub fn upcoming_reply(records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    let next = upcoming(records, now, UPCOMING_COUNT);
    if next.is_empty() {
        return "No upcoming deadlines 🎉".into();
    }
    let mut lines = vec!["⏭ Next up:".to_string(), String::new()];
    for (record, _) in &next {
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
    lines.pop();
    lines.join("\n")
}

/// Weekly summary text, shared by the scheduler and `/testnotify`.
pub fn weekly_summary(records: &[DeadlineRecord], now: NaiveDateTime) -> String {
    let filtered = filter_within(records, now, 7);
    if filtered.is_empty() {
        return "🗓 No deadlines this week 🎉".into();
    }
    format!("🗓 This week:\n\n{}", format_grouped(&filtered, now))
}

/// Dispatch a query command to its pure reply builder.
///
/// `Add`, `Delete`, and `TestNotify` mutate state or broadcast and are
/// handled by the channel layer; passing one of them here returns None.
pub fn query_reply(cmd: &Command, records: &[DeadlineRecord], now: NaiveDateTime) -> Option<String> {
    let text = match cmd {
        Command::Start => START_TEXT.to_string(),
        Command::Help => HELP_TEXT.to_string(),
        Command::List(arg) => list_reply(arg.as_deref(), records, now),
        Command::Today => horizon_reply(Horizon::Today, records, now),
        Command::Week | Command::Soon => horizon_reply(Horizon::Week, records, now),
        Command::Month => horizon_reply(Horizon::Month, records, now),
        Command::Upcoming => upcoming_reply(records, now),
        Command::Add(_) | Command::Delete(_) | Command::TestNotify => return None,
    };
    Some(text)
}
