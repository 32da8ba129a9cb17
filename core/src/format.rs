/// 動画の長さを "m:ss" で表示
///
/// 長さ不明（未指定・0・負数・NaN）は "00:00"。
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "00:00".to_string(),
    }
}

/// 件数ラベル（"1 view" / "12 views"）
pub fn format_count(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), "00:00");
        assert_eq!(format_duration(Some(0.0)), "00:00");
        assert_eq!(format_duration(Some(-3.0)), "00:00");
        assert_eq!(format_duration(Some(f64::NAN)), "00:00");
        assert_eq!(format_duration(Some(5.9)), "0:05");
        assert_eq!(format_duration(Some(65.0)), "1:05");
        assert_eq!(format_duration(Some(3_725.4)), "62:05");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0, "view", "views"), "0 views");
        assert_eq!(format_count(1, "view", "views"), "1 view");
        assert_eq!(format_count(1_204, "like", "likes"), "1204 likes");
    }
}
