/// Duration label parsing for item pages
use regex::Regex;
use std::sync::OnceLock;

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// Parse a free-text duration label into whole seconds.
///
/// Understands `M:SS` labels and labels carrying one or two numbers
/// (`"45 sec"`, `"1 min 5 sec"`). Anything else yields 0, which callers
/// treat as "unknown".
pub fn parse_duration(text: &str) -> u64 {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return 0;
    }

    let parts: Vec<&str> = compact.split(':').collect();
    if parts.len() == 2 {
        // A malformed M:SS label is not rescanned for digits
        return match (parse_number(parts[0]), parse_number(parts[1])) {
            (Some(minutes), Some(seconds)) => to_seconds(minutes, seconds),
            _ => 0,
        };
    }

    let numbers: Vec<Option<u64>> = digit_runs()
        .find_iter(&compact)
        .map(|m| parse_number(m.as_str()))
        .collect();

    match numbers.as_slice() {
        [Some(seconds)] => *seconds,
        [Some(minutes), Some(seconds)] => to_seconds(*minutes, *seconds),
        _ => 0,
    }
}

fn parse_number(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn to_seconds(minutes: u64, seconds: u64) -> u64 {
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .unwrap_or(0)
}
