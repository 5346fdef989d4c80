//! Human-readable byte sizes ("5MB" ↔ integer bytes).
//!
//! Units are binary multiples of 1024. Parsing returns 0 when the input
//! does not match `<number><unit>`; callers treat 0 as "unconfigured",
//! never as a legitimate zero-byte limit.

const UNITS: [(&str, u32); 5] = [("TB", 4), ("GB", 3), ("MB", 2), ("KB", 1), ("B", 0)];

/// Parses a size string like "5MB" or "1.5 GB" into bytes.
///
/// Case-insensitive; whitespace between number and unit is allowed.
/// Returns 0 if the input does not match.
pub fn parse_size(text: &str) -> u64 {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();

    for (suffix, exp) in UNITS {
        if let Some(number) = upper.strip_suffix(suffix) {
            let number = number.trim();
            if number.is_empty() {
                return 0;
            }
            let Ok(value) = number.parse::<f64>() else {
                return 0;
            };
            if value < 0.0 || !value.is_finite() {
                return 0;
            }
            return (value * 1024f64.powi(exp as i32)) as u64;
        }
    }

    0
}

/// Formats a byte count with the largest unit whose mantissa stays
/// below 1024, rounded to two decimals. 0 formats as "0 B".
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let suffix = UNITS[UNITS.len() - 1 - unit].0;
    let rounded = (value * 100.0).round() / 100.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{} {}", rounded.trunc() as u64, suffix)
    } else {
        format!("{rounded:.2} {suffix}")
    }
}
