//! DateTime字段转换工具
//!
//! 处理String/整数到DateTime的转换，无时区信息的输入按UTC解释

use crate::error::DocSyncResult;
use crate::types::DataValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// 不带时区的日期时间格式
const LOCAL_DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",     // 2024-01-15 14:30:00
    "%Y-%m-%d %H:%M:%S%.f",  // 2024-01-15 14:30:00.123
    "%Y-%m-%d %H:%M",        // 2024-01-15 14:30
    "%Y-%m-%dT%H:%M:%S",     // 2024-01-15T14:30:00
    "%Y-%m-%dT%H:%M:%S%.f",  // 2024-01-15T14:30:00.123
    "%Y-%m-%dT%H:%M",        // 2024-01-15T14:30
    "%Y/%m/%d %H:%M:%S",     // 2024/01/15 14:30:00
    "%Y/%m/%d %H:%M:%S%.f",  // 2024/01/15 14:30:00.123
    "%Y/%m/%d %H:%M",        // 2024/01/15 14:30
];

/// 纯日期格式，解析为当天UTC零点
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// 将原始值转换为日期时间
///
/// - DateTime 原样返回
/// - String 依次尝试 RFC3339、本地格式、纯日期
/// - Int 视为Unix毫秒时间戳
/// - Null/Undefined/空字符串原样返回
pub fn coerce_datetime(field: &str, raw: DataValue) -> DocSyncResult<DataValue> {
    match raw {
        DataValue::DateTime(_) | DataValue::Null | DataValue::Undefined => Ok(raw),
        DataValue::String(ref s) if s.is_empty() => Ok(raw),
        DataValue::String(s) => parse_datetime_str(field, &s).map(DataValue::DateTime),
        DataValue::Int(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| DataValue::DateTime(dt.into()))
            .ok_or_else(|| {
                crate::docsync_error!(coercion, field, format!("时间戳超出范围: {}", millis))
            }),
        other => Err(crate::docsync_error!(
            coercion,
            field,
            format!("不支持的数据类型 {}，期望日期字符串或时间戳", other.type_name())
        )),
    }
}

/// 解析日期时间字符串
pub fn parse_datetime_str(field: &str, datetime_str: &str) -> DocSyncResult<DateTime<FixedOffset>> {
    let input = datetime_str.trim();

    // 首先尝试直接解析为RFC3339格式（包含时区信息）
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    for format in &LOCAL_DATETIME_FORMATS {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive_dt).into());
        }
    }

    for format in &DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            if let Some(naive_dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&naive_dt).into());
            }
        }
    }

    Err(crate::docsync_error!(
        coercion,
        field,
        format!(
            "无法解析日期时间字符串 '{}'。支持的格式：RFC3339、2024-01-15 14:30:00、2024-01-15",
            datetime_str
        )
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime_str("created", "2014-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2014, 1, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let dt = parse_datetime_str("created", "2024-01-15T14:30:00+08:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn test_parse_local_format() {
        let dt = parse_datetime_str("created", "2024-01-15 14:30:00").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_invalid_string() {
        assert!(parse_datetime_str("created", "not a date").is_err());
        assert!(coerce_datetime("created", DataValue::Bool(true)).is_err());
    }

    #[test]
    fn test_idempotent() {
        let first = coerce_datetime("created", DataValue::from("2014-01-02")).unwrap();
        let second = coerce_datetime("created", first.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamp_millis() {
        let value = coerce_datetime("created", DataValue::Int(1_388_534_400_000)).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2014, 1, 1));
    }
}
