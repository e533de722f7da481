//! Time formatting helpers.

use std::time::Duration;

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render `d` with its two most significant units, e.g. `5m`, `1h 1m`.
/// Sub-second durations are shown in milliseconds.
pub fn format_duration(d: Duration) -> String {
    let mut remaining = d.as_secs();
    if remaining == 0 {
        return format!("{}ms", d.as_millis());
    }

    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        if parts.len() == 2 {
            break;
        }
        let count = remaining / size;
        remaining %= size;
        if count > 0 || !parts.is_empty() {
            parts.push(format!("{count}{suffix}"));
        }
    }
    parts.join(" ")
}
