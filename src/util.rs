use chrono::{Duration, NaiveDate};
use crate::errors::{Result, IndustryHubError};

// 日期转换工具
pub fn date_string_to_int(date_str: &str) -> Result<i32> {
    date_str.parse::<i32>().map_err(|e| IndustryHubError::DataError(e.to_string()))
}

pub fn int_to_naive_date(date_int: i32) -> Result<NaiveDate> {
    let date_str = date_int.to_string();
    if date_str.len() != 8 {
        return Err(IndustryHubError::DataError(format!("Invalid date format: {}", date_str)));
    }

    let year = date_str[0..4].parse::<i32>()
        .map_err(|e| IndustryHubError::DataError(e.to_string()))?;
    let month = date_str[4..6].parse::<u32>()
        .map_err(|e| IndustryHubError::DataError(e.to_string()))?;
    let day = date_str[6..8].parse::<u32>()
        .map_err(|e| IndustryHubError::DataError(e.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| IndustryHubError::DataError(format!("Invalid date: {}-{}-{}", year, month, day)))
}

/// 计算涨幅统计的起始日期
///
/// 按交易日窗口的1.4倍折算为日历天数，覆盖周末和节假日
pub fn lookback_start(today: NaiveDate, window_days: usize) -> NaiveDate {
    let calendar_days = (window_days as f64 * 1.4) as i64;
    today - Duration::days(calendar_days)
}

/// 计算正数样本的算术平均值，无正数样本时返回None
pub fn mean_of_positive(values: &[f64]) -> Option<f64> {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.is_empty() {
        return None;
    }
    Some(positive.iter().sum::<f64>() / positive.len() as f64)
}

/// 保留4位小数
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
