use chrono::{DateTime, Local, Utc};

/// Rounds `value` to `decimal_places`, with halves going up toward +inf.
pub fn round(value: f64, decimal_places: u32) -> f64 {
    let factor = 10f64.powi(decimal_places as i32);
    (value * factor + 0.5).floor() / factor
}

pub fn format_heart_rate(bpm: f64) -> String {
    format!("{:.0} bpm", bpm)
}

pub fn format_speed(kmh: f64) -> String {
    format!("{:.2} km/h", kmh)
}

// Thousands separated, e.g. 12,345
pub fn format_steps(steps: u64) -> String {
    let digits = steps.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_clock(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub fn format_optional(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_whole_numbers() {
        assert_eq!(round(104.5, 0), 105.0);
        assert_eq!(round(104.49, 0), 104.0);
        assert_eq!(round(105.0, 0), 105.0);
    }

    #[test]
    fn test_round_two_places() {
        assert_eq!(round(5.5, 2), 5.5);
        assert_eq!(round(4.666_666, 2), 4.67);
        assert_eq!(round(3.001, 2), 3.0);
    }

    #[test]
    fn test_round_half_goes_up_for_negatives() {
        // Matches floor(x + 0.5)
        assert_eq!(round(-2.5, 0), -2.0);
    }

    #[test]
    fn test_format_steps() {
        assert_eq!(format_steps(0), "0");
        assert_eq!(format_steps(999), "999");
        assert_eq!(format_steps(1000), "1,000");
        assert_eq!(format_steps(12_345_678), "12,345,678");
    }

    #[test]
    fn test_format_metrics() {
        assert_eq!(format_heart_rate(121.4), "121 bpm");
        assert_eq!(format_speed(12.346), "12.35 km/h");
        assert_eq!(format_optional(None, format_speed), "-");
        assert_eq!(format_optional(Some(3.0), format_speed), "3.00 km/h");
    }
}
