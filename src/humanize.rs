use chrono::{DateTime, Local};

const SUFFIXES: [&str; 5] = ["B", "K", "M", "G", "T"];
const UNIT: f64 = 1024.0;

/// Human readable size rendering for table cells and summaries.
pub fn format_size(bytes: i64) -> String {
    let mut value = bytes.max(0) as f64;
    let mut idx = 0usize;

    while value >= UNIT && idx < SUFFIXES.len() - 1 {
        value /= UNIT;
        idx += 1;
    }

    if idx == 0 {
        format!("{:.0} {}", value, SUFFIXES[idx])
    } else {
        format!("{:.1} {}", value, SUFFIXES[idx])
    }
}

/// Parses a human size like `512`, `1.5K`, `2M`, `1KB` or `3GiB`.
/// Binary multiples throughout; returns None on anything else.
pub fn parse_size(input: &str) -> Option<i64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let split = input
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(input.len());
    let (digits, suffix) = input.split_at(split);
    let value: f64 = digits.parse().ok()?;

    let multiplier: f64 = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1.0,
        "K" | "KB" | "KIB" => UNIT,
        "M" | "MB" | "MIB" => UNIT * UNIT,
        "G" | "GB" | "GIB" => UNIT * UNIT * UNIT,
        "T" | "TB" | "TIB" => UNIT * UNIT * UNIT * UNIT,
        _ => return None,
    };

    Some((value * multiplier) as i64)
}

/// Parses a string of 3 or 4 octal digits as a *NIX permission mode.
pub fn parse_mode(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() || input.len() > 7 {
        return None;
    }
    u32::from_str_radix(input, 8).ok()
}

/// Coarse relative rendering of a timestamp, in the `N units ago` shape
/// the table's date column uses.
pub fn relative_time(then: DateTime<Local>) -> String {
    let now = Local::now();
    let (delta, suffix) = if then <= now {
        (now - then, "ago")
    } else {
        (then - now, "from now")
    };

    let seconds = delta.num_seconds();
    let (count, unit) = match seconds {
        0..=44 => return "now".to_string(),
        45..=89 => (1, "minute"),
        _ => {
            let minutes = delta.num_minutes();
            let hours = delta.num_hours();
            let days = delta.num_days();
            if minutes < 60 {
                (minutes, "minute")
            } else if hours < 24 {
                (hours, "hour")
            } else if days < 7 {
                (days, "day")
            } else if days < 31 {
                (days / 7, "week")
            } else if days < 365 {
                (days / 30, "month")
            } else {
                (days / 365, "year")
            }
        }
    };

    if count == 1 {
        format!("1 {unit} {suffix}")
    } else {
        format!("{count} {unit}s {suffix}")
    }
}
