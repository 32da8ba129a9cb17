use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::clock::Clock;

pub const UNKNOWN_DATE: &str = "Unknown date";
pub const JUST_NOW: &str = "Just now";

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const WEEK: f64 = 604_800.0;

/// 時計から現在時刻を取って相対時刻に変換
pub fn format_time_ago(input: Option<&str>, clock: &dyn Clock) -> String {
    format_time_ago_at(input, clock.now())
}

/// タイムスタンプを "3 hours ago" 形式に変換
///
/// 1週間を超えたものは "Jan 5, 2024" の絶対日付になる。
/// 未指定・パース不能な入力は [`UNKNOWN_DATE`] を返し、パニックしない。
/// 未来の時刻は特別扱いせず、同じ閾値判定を通す（負の差分は "Just now"）。
pub fn format_time_ago_at(input: Option<&str>, now: OffsetDateTime) -> String {
    let Some(date) = input.and_then(parse_timestamp) else {
        return UNKNOWN_DATE.to_string();
    };

    let seconds_past = (now - date).as_seconds_f64();

    if seconds_past < MINUTE {
        JUST_NOW.to_string()
    } else if seconds_past < HOUR {
        plural_ago((seconds_past / MINUTE).floor() as i64, "minute")
    } else if seconds_past <= DAY {
        plural_ago((seconds_past / HOUR).floor() as i64, "hour")
    } else if seconds_past <= WEEK {
        plural_ago((seconds_past / DAY).floor() as i64, "day")
    } else {
        format_short_date(date)
    }
}

/// APIが返す日時文字列をパース
///
/// オフセット無しの日時と日付のみの文字列はUTCとして扱う。
pub fn parse_timestamp(input: &str) -> Option<OffsetDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Iso8601::DEFAULT) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(s, &Iso8601::DEFAULT) {
        return Some(dt.assume_utc());
    }
    if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }

    log::debug!("Unparseable timestamp: {:?}", s);
    None
}

fn plural_ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {} ago", count, unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

fn format_short_date(date: OffsetDateTime) -> String {
    date.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        ))
        .unwrap_or_else(|_| UNKNOWN_DATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use time::macros::datetime;
    use time::Duration;

    const BASE: OffsetDateTime = datetime!(2024-03-10 12:00 UTC);

    fn ago(seconds: i64) -> String {
        let input = (BASE - Duration::seconds(seconds))
            .format(&Rfc3339)
            .unwrap();
        format_time_ago_at(Some(&input), BASE)
    }

    #[test]
    fn test_missing_and_invalid_input() {
        assert_eq!(format_time_ago_at(None, BASE), "Unknown date");
        assert_eq!(format_time_ago_at(Some(""), BASE), "Unknown date");
        assert_eq!(format_time_ago_at(Some("   "), BASE), "Unknown date");
        assert_eq!(format_time_ago_at(Some("not-a-date"), BASE), "Unknown date");
        assert_eq!(format_time_ago_at(Some("2024-13-45T99:00:00Z"), BASE), "Unknown date");
    }

    #[test]
    fn test_thresholds() {
        let cases = [
            (0, "Just now"),
            (30, "Just now"),
            (59, "Just now"),
            (60, "1 minute ago"),
            (90, "1 minute ago"),
            (150, "2 minutes ago"),
            (3_599, "59 minutes ago"),
            (3_600, "1 hour ago"),
            (7_199, "1 hour ago"),
            (7_200, "2 hours ago"),
            (86_400, "24 hours ago"),
            (86_401, "1 day ago"),
            (172_800, "2 days ago"),
            (604_800, "7 days ago"),
        ];
        for (seconds, expected) in cases {
            assert_eq!(ago(seconds), expected, "{} seconds ago", seconds);
        }
    }

    #[test]
    fn test_older_than_a_week_is_absolute() {
        assert_eq!(ago(604_801), "Mar 3, 2024");
        assert_eq!(ago(86_400 * 400), "Feb 4, 2023");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        assert_eq!(ago(-5), "Just now");
        assert_eq!(ago(-86_400 * 3), "Just now");
    }

    #[test]
    fn test_scenarios_with_fixed_clock() {
        let input = Some("2024-01-01T00:00:00Z");
        let clock = FixedClock::new(datetime!(2024-01-01 0:00:45 UTC));
        assert_eq!(format_time_ago(input, &clock), "Just now");

        clock.set(datetime!(2024-01-01 0:10 UTC));
        assert_eq!(format_time_ago(input, &clock), "10 minutes ago");

        clock.set(datetime!(2024-01-08 0:00 UTC));
        assert_eq!(format_time_ago(input, &clock), "7 days ago");

        clock.set(datetime!(2024-01-08 0:00:01 UTC));
        assert_eq!(format_time_ago(input, &clock), "Jan 1, 2024");
        // 同じ入力と時刻なら同じ結果
        assert_eq!(format_time_ago(input, &clock), format_time_ago(input, &clock));
    }

    #[test]
    fn test_accepted_formats() {
        let now = datetime!(2024-01-01 2:00 UTC);
        assert_eq!(
            format_time_ago_at(Some("2024-01-01T00:00:00.000Z"), now),
            "2 hours ago"
        );
        assert_eq!(
            format_time_ago_at(Some("2024-01-01T09:00:00+09:00"), now),
            "2 hours ago"
        );
        assert_eq!(format_time_ago_at(Some("2024-01-01T00:00:00"), now), "2 hours ago");
        assert_eq!(format_time_ago_at(Some("2024-01-01"), now), "2 hours ago");
    }

    #[test]
    fn test_sub_second_precision_is_floored() {
        let now = datetime!(2024-01-01 0:01:00.500 UTC);
        assert_eq!(
            format_time_ago_at(Some("2024-01-01T00:00:00.600Z"), now),
            "Just now"
        );
    }
}
