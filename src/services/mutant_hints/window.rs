//! 每日提示额度的统计窗口
//!
//! 窗口起点是“本地时间最近一次到达重置时刻”的瞬间，终点是起点之后整 24 小时。

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{HWSystemError, Result};

/// 解析 IANA 时区名
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| HWSystemError::validation(format!("无效的时区: {name}")))
}

/// 计算 `now` 所在的额度窗口 `[start, end)`
pub fn hint_limit_window(
    reset_time: NaiveTime,
    timezone: Tz,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_now = now.with_timezone(&timezone);
    let today = local_now.date_naive();

    let date = if local_now.time() < reset_time {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    };

    let start = resolve_local(timezone, date.and_time(reset_time));
    (start, start + TimeDelta::hours(24))
}

fn resolve_local(timezone: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // 回拨重复的时刻取较早的一次
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // 跳过的时刻顺延一小时
        LocalResult::None => timezone
            .from_local_datetime(&(naive - TimeDelta::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc) + TimeDelta::hours(1))
            .unwrap_or_else(|| naive.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_midnight_reset_gives_calendar_days() {
        let (start, end) = hint_limit_window(time(0, 0), Tz::UTC, utc("2024-01-15T13:00:00Z"));
        assert_eq!(start, utc("2024-01-15T00:00:00Z"));
        assert_eq!(end, utc("2024-01-16T00:00:00Z"));
    }

    #[test]
    fn test_reset_instant_opens_new_window() {
        let (start, _) = hint_limit_window(time(0, 0), Tz::UTC, utc("2024-01-15T00:00:00Z"));
        assert_eq!(start, utc("2024-01-15T00:00:00Z"));
    }

    #[test]
    fn test_window_flips_at_local_reset_time() {
        let chicago = parse_timezone("America/Chicago").unwrap();

        // 11:49 CDT，属于前一天 11:50 开始的窗口
        let (start, end) = hint_limit_window(time(11, 50), chicago, utc("2024-03-20T16:49:00Z"));
        assert_eq!(start, utc("2024-03-19T16:50:00Z"));
        assert_eq!(end, utc("2024-03-20T16:50:00Z"));

        // 11:51 CDT，已进入新窗口
        let (start, end) = hint_limit_window(time(11, 50), chicago, utc("2024-03-20T16:51:00Z"));
        assert_eq!(start, utc("2024-03-20T16:50:00Z"));
        assert_eq!(end, utc("2024-03-21T16:50:00Z"));
    }

    #[test]
    fn test_timezone_shifts_date() {
        let tokyo = parse_timezone("Asia/Tokyo").unwrap();
        // 东京已经是 1 月 16 日 01:00
        let (start, _) = hint_limit_window(time(0, 0), tokyo, utc("2024-01-15T16:00:00Z"));
        assert_eq!(start, utc("2024-01-15T15:00:00Z"));
    }

    #[test]
    fn test_reset_time_skipped_by_dst() {
        let new_york = parse_timezone("America/New_York").unwrap();
        // 2024-03-10 02:00 直接跳到 03:00，02:30 不存在
        let (start, end) = hint_limit_window(time(2, 30), new_york, utc("2024-03-10T16:00:00Z"));
        assert_eq!(start, utc("2024-03-10T07:30:00Z"));
        assert_eq!(end, utc("2024-03-11T07:30:00Z"));
    }

    #[test]
    fn test_reset_time_repeated_by_dst() {
        let new_york = parse_timezone("America/New_York").unwrap();
        // 2024-11-03 01:30 出现两次，取夏令时那一次
        let (start, end) = hint_limit_window(time(1, 30), new_york, utc("2024-11-03T17:00:00Z"));
        assert_eq!(start, utc("2024-11-03T05:30:00Z"));
        assert_eq!(end, utc("2024-11-04T05:30:00Z"));
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("Europe/Berlin").is_ok());
        assert_eq!(parse_timezone("Mars/Olympus").unwrap_err().code(), "E007");
    }
}
