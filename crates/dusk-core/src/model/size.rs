/// Size formatting utilities — human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with two decimals in the largest unit that keeps the
/// value below 1024 (binary steps, short labels).
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Format a count with thousands separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
