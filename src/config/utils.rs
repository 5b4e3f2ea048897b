/// Parse a boolean value from a string, supporting multiple formats
///
/// Accepts: "true", "false", "1", "0", "yes", "no" (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a duration in milliseconds
///
/// Accepts a bare number of milliseconds ("600"), or a number with an
/// `ms` or `s` suffix ("600ms", "1.5s").
pub fn parse_duration_ms(s: &str) -> Option<u64> {
    let s = s.trim().to_lowercase();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse::<u64>().ok();
    }
    if let Some(secs) = s.strip_suffix('s') {
        let secs = secs.trim().parse::<f64>().ok()?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        return Some((secs * 1000.0).round() as u64);
    }
    s.parse::<u64>().ok()
}
