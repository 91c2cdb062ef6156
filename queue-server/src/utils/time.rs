//! 时间工具函数 — 业务时区转换
//!
//! "今天"、时段截断、取消截止时间均以业务时区为准；
//! repository 层只接收 `i64` Unix millis 时间戳。

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时刻字符串 (HH:MM:SS 或 HH:MM)
pub fn parse_time(time: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| AppError::validation(format!("Invalid time format: {}", time)))
}

/// 当前业务时区本地时间
pub fn now_local(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// 当前 Unix millis (与时区无关)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 预约时刻的 12 小时制渲染 (如 "9:30 AM")
pub fn format_12h(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// 预约时刻的完整人类可读渲染 (如 "August 7, 2026 at 9:30 AM")
pub fn format_appointment(date: NaiveDate, time: NaiveTime) -> String {
    date.and_time(time)
        .format("%B %-d, %Y at %-I:%M %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("03/01/2026").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn parses_time_with_and_without_seconds() {
        let expected = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_time("09:30:00").unwrap(), expected);
        assert_eq!(parse_time("09:30").unwrap(), expected);
        assert!(parse_time("9 o'clock").is_err());
    }

    #[test]
    fn renders_appointment_instant() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_appointment(date, time), "August 7, 2026 at 9:30 AM");
        assert_eq!(format_12h(time), "9:30 AM");
    }
}
