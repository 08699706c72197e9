use crate::error::{ImportError, ImportResult};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// 数量: 先按浮点解析再向零截断 (2.9 -> 2, -2.9 -> -2)
pub fn quantity(field: &'static str, text: &str) -> ImportResult<i64> {
    let invalid = || ImportError::NumericCoercion {
        field,
        value: text.to_string(),
    };

    let value: f64 = text.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    let truncated = value.trunc();
    // i64::MAX as f64 会进位到 2^63，必须用严格小于
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(truncated as i64)
}

/// 金额: 十进制解析，保留原始精度
pub fn decimal(field: &'static str, text: &str) -> ImportResult<BigDecimal> {
    BigDecimal::from_str(text.trim()).map_err(|_| ImportError::NumericCoercion {
        field,
        value: text.to_string(),
    })
}

/// ISO-8601 日期或日期时间 -> 日历日期
///
/// 带时区偏移的时间取其书写时的本地日期，不换算到 UTC。
pub fn date(field: &'static str, text: &str) -> ImportResult<NaiveDate> {
    parse_iso_date(text).ok_or_else(|| ImportError::InvalidDate {
        field,
        value: text.to_string(),
    })
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local().date());
    }
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.naive_local().date());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
