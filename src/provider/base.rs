use crate::models::industry::{StockBasic, DailyBasic, DailyBar};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Base trait for market data providers
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Get the provider name, used in log lines and cache keys
    fn provider_name(&self) -> &'static str;

    /// Fetch the full listing of securities with industry classification
    async fn fetch_stock_basic(&self) -> Result<Vec<StockBasic>>;

    /// Fetch fundamental snapshots for a batch of securities
    async fn fetch_daily_basic(&self, ts_codes: &[String]) -> Result<Vec<DailyBasic>>;

    /// Fetch daily bars for a specific security over a date range
    async fn fetch_daily(&self, ts_code: &str, start: &NaiveDate, end: &NaiveDate) -> Result<Vec<DailyBar>>;
}
