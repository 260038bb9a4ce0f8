//! Human-readable distance and duration strings for the instruction banner.

/// `"0 m"`, `"350 m"`, `"1.2 km"`. Values under a kilometer round to whole
/// meters; negative or non-finite input is shown as zero.
pub fn format_distance(meters: f64) -> String {
    let meters = if meters.is_finite() { meters.max(0.0) } else { 0.0 };
    if meters.round() < 1000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// `"0 min"`, `"12 min"`, `"1h 5m"`. Seconds round to the nearest minute.
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).round() as u64;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}
