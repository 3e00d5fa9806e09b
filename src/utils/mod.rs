use std::time::Instant;
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

pub const NOT_AVAILABLE: &str = "N/A";

// ── Number formatting ────────────────────────────────────────────────────────

/// Table cell: fixed two decimals. 12345.6 → "12345.60"
pub fn format_fixed(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Abbreviated: 12345.6 → "12.35K" | 2.5e9 → "2.50B" | 999 → "999.00"
pub fn format_abbreviated(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", v / 1e3)
    } else {
        format!("{:.2}", v)
    }
}

/// Market-cap style: 2.9e12 → "$2.90T"
pub fn format_currency(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    if v >= 1e12 {
        format!("${:.2}T", v / 1e12)
    } else if v >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else {
        format!("${:.2}", v)
    }
}

/// Format a large integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

// ── Period labels ────────────────────────────────────────────────────────────

/// "2023-09-30 00:00:00" → "2023-09-30" | "2023-09-30T00:00:00" → "2023-09-30"
pub fn strip_time_component(period: &str) -> &str {
    let period = period.trim();
    let date = period.split(' ').next().unwrap_or(period);
    match date.split_once('T') {
        Some((day, _)) if day.len() == 10 && day.as_bytes()[4] == b'-' => day,
        _ => date,
    }
}

/// Recommendation period codes → readable label.
pub fn recommendation_period_label(code: &str) -> &str {
    match code {
        "0m" => "Current Month",
        "-1m" => "One Month Ago",
        "-2m" => "Two Months Ago",
        "-3m" => "Three Months Ago",
        other => other,
    }
}

/// Search term → URL-path form: "Bell Canada Inc." → "bell-canada-inc-"
pub fn company_slug(term: &str) -> String {
    let mut slug = String::with_capacity(term.len());
    let mut in_gap = false;
    for ch in term.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug
}
