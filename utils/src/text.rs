//! Helpers for putting upstream payloads into errors and logs.

/// Default cap for upstream bodies embedded in error messages.
pub const MAX_DIAGNOSTIC_LEN: usize = 512;

/// Cut `body` to at most `max` bytes on a char boundary, marking the cut.
pub fn truncate_for_log(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes total)", &body[..end], body.len())
}
