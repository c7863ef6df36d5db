/// Parse a non-negative point amount. Signs, blanks and non-digits are rejected.
pub fn parse_points(raw: &str) -> Option<u64> {
    let value = raw.trim();
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    value.parse::<u64>().ok()
}

/// Whether `raw` looks like a negative amount, so callers can explain the rejection.
pub fn is_negative_amount(raw: &str) -> bool {
    let value = raw.trim();
    value.len() > 1
        && value.starts_with('-')
        && value[1..].bytes().all(|byte| byte.is_ascii_digit())
}
