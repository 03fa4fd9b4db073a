use ipblock::blacklist::Entry;

/// Describes how long an entry stays blocked, e.g. "expires in 5 minutes".
pub fn format_expiry(entry: &Entry, now: i64) -> String {
    if entry.is_expired(now) {
        return "expired, awaiting eviction".to_string();
    }
    match entry.remaining(now) {
        None => "never expires".to_string(),
        Some(seconds) => format!("expires in {}", format_duration(seconds)),
    }
}

fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" })
    } else if seconds < 60 * 60 {
        let minutes = seconds / 60;
        format!("{} minute{}", minutes, if minutes > 1 { "s" } else { "" })
    } else if seconds < 60 * 60 * 24 {
        let hours = seconds / (60 * 60);
        format!("{} hour{}", hours, if hours > 1 { "s" } else { "" })
    } else {
        let days = seconds / (60 * 60 * 24);
        format!("{} day{}", days, if days > 1 { "s" } else { "" })
    }
}
