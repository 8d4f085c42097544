use crate::cache::{get_or_compute, MetricsCache};
use crate::config::Config;
use crate::errors::Result;
use crate::models::industry::{
    IndustryMetrics, DEFAULT_GROWTH, DEFAULT_GROWTH_WINDOW, DEFAULT_PB, DEFAULT_PE,
    UNKNOWN_INDUSTRY,
};
use crate::provider::base::DataProvider;
use crate::provider::retry::fetch_with_retry;
use crate::util;
use chrono::{FixedOffset, Utc};
use log::{error, info, warn};
use std::sync::Arc;

/// 行业分类很少变化，使用较长缓存期
const INDUSTRY_TTL_DAYS: f64 = 30.0;
/// 行业估值指标每天更新一次即可
const VALUATION_TTL_DAYS: f64 = 1.0;
/// 历史涨幅每小时更新一次即可
const GROWTH_TTL_DAYS: f64 = 0.04;

/// 行业指标查询服务
///
/// 所有公开方法都保证返回有效值，失败时退回到文档约定的默认值，
/// 失败原因通过日志输出，不向调用方抛出错误。
pub struct IndustryMetricsService {
    config: Config,
    provider: Arc<dyn DataProvider>,
    cache: Arc<dyn MetricsCache>,
}

impl IndustryMetricsService {
    /// 创建新的行业指标查询服务
    pub fn new(config: Config, provider: Arc<dyn DataProvider>, cache: Arc<dyn MetricsCache>) -> Self {
        Self { config, provider, cache }
    }

    /// 查询股票所属行业
    pub async fn resolve_industry(&self, stock_code: &str) -> String {
        let cache_key = format!(
            "{}_industry_by_code_{}",
            self.provider.provider_name(),
            stock_code
        );

        let result = get_or_compute(self.cache.as_ref(), &cache_key, INDUSTRY_TTL_DAYS, || {
            self.lookup_industry(stock_code)
        })
        .await;

        match result {
            Ok(industry) => {
                info!("获取股票 {} 所属行业: {}", stock_code, industry);
                industry
            }
            Err(e) => {
                error!("获取股票 {} 行业信息失败: {}", stock_code, e);
                UNKNOWN_INDUSTRY.to_string()
            }
        }
    }

    async fn lookup_industry(&self, stock_code: &str) -> Result<String> {
        let stocks = match fetch_with_retry("stock_basic", self.config.max_retries, || {
            self.provider.fetch_stock_basic()
        })
        .await
        {
            Some(stocks) => stocks,
            None => return Ok(UNKNOWN_INDUSTRY.to_string()),
        };

        // 按代码包含关系匹配，返回第一个匹配的行业
        match stocks.iter().find(|s| s.ts_code.contains(stock_code)) {
            Some(stock) if !stock.industry.is_empty() => Ok(stock.industry.clone()),
            _ => {
                warn!("未找到股票 {} 的行业信息", stock_code);
                Ok(UNKNOWN_INDUSTRY.to_string())
            }
        }
    }

    /// 估算行业平均估值，返回(平均PE, 平均PB)
    pub async fn estimate_valuation(&self, industry: &str) -> (f64, f64) {
        let cache_key = format!(
            "{}_industry_valuation_{}",
            self.provider.provider_name(),
            industry.replace(' ', "_")
        );

        let result = get_or_compute(self.cache.as_ref(), &cache_key, VALUATION_TTL_DAYS, || {
            self.compute_valuation(industry)
        })
        .await;

        match result {
            Ok((pe, pb)) => {
                info!("获取行业 {} 估值: PE={}, PB={}", industry, pe, pb);
                (pe, pb)
            }
            Err(e) => {
                error!("获取行业估值失败: {}", e);
                (DEFAULT_PE, DEFAULT_PB)
            }
        }
    }

    async fn compute_valuation(&self, industry: &str) -> Result<(f64, f64)> {
        let stocks = match fetch_with_retry("stock_basic", self.config.max_retries, || {
            self.provider.fetch_stock_basic()
        })
        .await
        {
            Some(stocks) => stocks,
            None => return Ok((DEFAULT_PE, DEFAULT_PB)),
        };

        // 限制成分股数量避免触发接口限制
        let codes: Vec<String> = stocks
            .iter()
            .filter(|s| s.industry == industry)
            .map(|s| s.ts_code.clone())
            .take(self.config.valuation_sample_limit)
            .collect();

        if codes.is_empty() {
            warn!("未找到行业 {} 的成分股", industry);
            return Ok((DEFAULT_PE, DEFAULT_PB));
        }

        // 分批获取基本面数据，单批失败跳过，样本相应缩小
        let mut snapshots = Vec::new();
        for batch in codes.chunks(self.config.fundamental_batch_size) {
            match self.provider.fetch_daily_basic(batch).await {
                Ok(rows) => snapshots.extend(rows),
                Err(e) => {
                    warn!("获取批次数据失败: {}", e);
                    continue;
                }
            }
        }

        if snapshots.is_empty() {
            warn!("未能获取行业 {} 的估值数据", industry);
            return Ok((DEFAULT_PE, DEFAULT_PB));
        }

        let pes: Vec<f64> = snapshots.iter().filter_map(|s| s.pe).collect();
        let pbs: Vec<f64> = snapshots.iter().filter_map(|s| s.pb).collect();

        // 非正值视为无效样本，PE和PB各自独立兜底
        let avg_pe = util::mean_of_positive(&pes).unwrap_or(DEFAULT_PE);
        let avg_pb = util::mean_of_positive(&pbs).unwrap_or(DEFAULT_PB);

        Ok((avg_pe, avg_pb))
    }

    /// 计算行业近window_days个交易日的平均涨幅
    pub async fn estimate_growth(&self, industry: &str, window_days: usize) -> f64 {
        let cache_key = format!(
            "{}_industry_growth_{}_{}days",
            self.provider.provider_name(),
            industry.replace(' ', "_"),
            window_days
        );

        let result = get_or_compute(self.cache.as_ref(), &cache_key, GROWTH_TTL_DAYS, || {
            self.compute_growth(industry, window_days)
        })
        .await;

        match result {
            Ok(growth) => {
                info!(
                    "获取行业 {} 近 {} 日涨幅: {:.2}%",
                    industry,
                    window_days,
                    growth * 100.0
                );
                growth
            }
            Err(e) => {
                error!("获取行业涨幅失败: {}", e);
                DEFAULT_GROWTH
            }
        }
    }

    async fn compute_growth(&self, industry: &str, window_days: usize) -> Result<f64> {
        let stocks = match fetch_with_retry("stock_basic", self.config.max_retries, || {
            self.provider.fetch_stock_basic()
        })
        .await
        {
            Some(stocks) => stocks,
            None => return Ok(DEFAULT_GROWTH),
        };

        // 选择部分成分股计算平均涨幅，避免触发接口限制
        let sample: Vec<String> = stocks
            .iter()
            .filter(|s| s.industry == industry)
            .map(|s| s.ts_code.clone())
            .take(self.config.growth_sample_limit)
            .collect();

        if sample.is_empty() {
            warn!("未找到行业 {} 的成分股", industry);
            return Ok(DEFAULT_GROWTH);
        }

        // 以东八区日期为基准，日历区间按交易日窗口的1.4倍折算
        let tz_offset: FixedOffset = "+08:00".parse()?;
        let today = Utc::now().with_timezone(&tz_offset).date_naive();
        let start = util::lookback_start(today, window_days);

        let mut growth_rates = Vec::new();
        for ts_code in &sample {
            let mut bars = match self.provider.fetch_daily(ts_code, &start, &today).await {
                Ok(bars) => bars,
                Err(e) => {
                    warn!("计算股票 {} 涨幅失败: {}", ts_code, e);
                    continue;
                }
            };

            if bars.len() < 2 {
                continue;
            }

            // 按交易日升序排列，取窗口内最后window_days条
            bars.sort_by_key(|b| b.trade_date);
            let window = if bars.len() > window_days {
                &bars[bars.len() - window_days..]
            } else {
                &bars[..]
            };

            if window.len() < 2 {
                continue;
            }

            let start_price = window[0].close;
            let end_price = window[window.len() - 1].close;
            if start_price > 0.0 {
                growth_rates.push((end_price - start_price) / start_price);
            }
        }

        if growth_rates.is_empty() {
            warn!("未能计算行业 {} 的涨幅数据", industry);
            return Ok(DEFAULT_GROWTH);
        }

        let avg = growth_rates.iter().sum::<f64>() / growth_rates.len() as f64;
        Ok(util::round4(avg))
    }

    /// 综合查询股票的行业指标
    ///
    /// 行业无法识别时直接返回全默认值，不再发起估值和涨幅查询
    pub async fn query_metrics(&self, stock_code: &str) -> IndustryMetrics {
        info!("开始查询股票 {} 的行业指标", stock_code);

        let industry = self.resolve_industry(stock_code).await;
        if industry == UNKNOWN_INDUSTRY {
            warn!("无法确定股票 {} 的行业", stock_code);
            return IndustryMetrics::fallback(stock_code);
        }

        let (pe, pb) = self.estimate_valuation(&industry).await;
        let growth = self.estimate_growth(&industry, DEFAULT_GROWTH_WINDOW).await;

        let result = IndustryMetrics {
            stock: stock_code.to_string(),
            industry,
            industry_avg_pe: pe,
            industry_avg_pb: pb,
            industry_growth: growth,
        };
        info!("成功获取行业指标: {:?}", result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::errors::IndustryHubError;
    use crate::models::industry::{DailyBar, DailyBasic, StockBasic};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 可编程的测试数据提供者，记录每个接口的调用次数
    #[derive(Default)]
    struct FakeProvider {
        stocks: Vec<StockBasic>,
        snapshots: Vec<DailyBasic>,
        bars: HashMap<String, Vec<DailyBar>>,
        fail_daily_basic: bool,
        stock_basic_calls: AtomicUsize,
        daily_basic_calls: AtomicUsize,
        daily_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn with_stock(mut self, ts_code: &str, industry: &str) -> Self {
            self.stocks.push(StockBasic {
                ts_code: ts_code.to_string(),
                symbol: ts_code.split('.').next().unwrap_or_default().to_string(),
                name: format!("股票{}", ts_code),
                industry: industry.to_string(),
            });
            self
        }

        fn with_snapshot(mut self, ts_code: &str, pe: Option<f64>, pb: Option<f64>) -> Self {
            self.snapshots.push(DailyBasic {
                ts_code: ts_code.to_string(),
                pe,
                pb,
            });
            self
        }

        fn with_bars(mut self, ts_code: &str, closes: &[f64]) -> Self {
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, close)| DailyBar {
                    ts_code: ts_code.to_string(),
                    trade_date: 20240101 + i as i32,
                    close: *close,
                })
                .collect();
            self.bars.insert(ts_code.to_string(), bars);
            self
        }
    }

    #[async_trait]
    impl DataProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_stock_basic(&self) -> Result<Vec<StockBasic>> {
            self.stock_basic_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.stocks.clone())
        }

        async fn fetch_daily_basic(&self, ts_codes: &[String]) -> Result<Vec<DailyBasic>> {
            self.daily_basic_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_daily_basic {
                return Err(IndustryHubError::ProviderError("rate limited".to_string()));
            }
            Ok(self
                .snapshots
                .iter()
                .filter(|s| ts_codes.contains(&s.ts_code))
                .cloned()
                .collect())
        }

        async fn fetch_daily(
            &self,
            ts_code: &str,
            _start: &NaiveDate,
            _end: &NaiveDate,
        ) -> Result<Vec<DailyBar>> {
            self.daily_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bars.get(ts_code).cloned().unwrap_or_default())
        }
    }

    fn service(provider: FakeProvider) -> (IndustryMetricsService, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let service = IndustryMetricsService::new(
            Config::new(),
            provider.clone(),
            Arc::new(MemoryCache::new()),
        );
        (service, provider)
    }

    #[tokio::test]
    async fn test_resolve_industry_matches_code_substring() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("000001.SZ", "银行")
                .with_stock("600519.SH", "Liquor"),
        );

        assert_eq!(service.resolve_industry("600519").await, "Liquor");
    }

    #[tokio::test]
    async fn test_resolve_industry_unknown_when_no_match() {
        let (service, _) = service(FakeProvider::default().with_stock("000001.SZ", "银行"));

        assert_eq!(service.resolve_industry("600519").await, UNKNOWN_INDUSTRY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_industry_unknown_after_retries_exhausted() {
        let (service, provider) = service(FakeProvider::default());

        assert_eq!(service.resolve_industry("600519").await, UNKNOWN_INDUSTRY);
        assert_eq!(provider.stock_basic_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_estimate_valuation_averages_positive_samples() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_stock("000858.SZ", "白酒")
                .with_stock("000001.SZ", "银行")
                .with_snapshot("600519.SH", Some(30.0), Some(9.0))
                .with_snapshot("000858.SZ", Some(20.0), Some(-1.0)),
        );

        let (pe, pb) = service.estimate_valuation("白酒").await;
        assert_eq!(pe, 25.0);
        // 负PB被过滤，只剩一个有效样本
        assert_eq!(pb, 9.0);
    }

    #[tokio::test]
    async fn test_estimate_valuation_defaults_when_industry_empty() {
        let (service, provider) = service(FakeProvider::default().with_stock("000001.SZ", "银行"));

        assert_eq!(service.estimate_valuation("白酒").await, (DEFAULT_PE, DEFAULT_PB));
        assert_eq!(provider.daily_basic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_estimate_valuation_defaults_when_all_samples_invalid() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_snapshot("600519.SH", Some(-3.0), None),
        );

        assert_eq!(service.estimate_valuation("白酒").await, (DEFAULT_PE, DEFAULT_PB));
    }

    #[tokio::test]
    async fn test_estimate_valuation_defaults_when_batches_fail() {
        let mut provider = FakeProvider::default().with_stock("600519.SH", "白酒");
        provider.fail_daily_basic = true;
        let (service, _) = service(provider);

        assert_eq!(service.estimate_valuation("白酒").await, (DEFAULT_PE, DEFAULT_PB));
    }

    #[tokio::test]
    async fn test_estimate_growth_averages_simple_returns() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_stock("000858.SZ", "白酒")
                .with_bars("600519.SH", &[100.0, 105.0, 110.0])
                .with_bars("000858.SZ", &[50.0, 52.0, 60.0]),
        );

        // (110-100)/100 = 0.1, (60-50)/50 = 0.2
        assert_eq!(service.estimate_growth("白酒", 252).await, 0.15);
    }

    #[tokio::test]
    async fn test_estimate_growth_rounds_to_four_decimals() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_bars("600519.SH", &[100.0, 112.3456]),
        );

        assert_eq!(service.estimate_growth("白酒", 252).await, 0.1235);
    }

    #[tokio::test]
    async fn test_estimate_growth_uses_trailing_window_only() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                // 窗口为2时只取最后两条
                .with_bars("600519.SH", &[10.0, 100.0, 110.0]),
        );

        assert_eq!(service.estimate_growth("白酒", 2).await, 0.1);
    }

    #[tokio::test]
    async fn test_estimate_growth_defaults_when_no_valid_series() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_stock("000858.SZ", "白酒")
                // 单条记录不足以计算涨幅
                .with_bars("600519.SH", &[100.0])
                // 起始价为0无法计算
                .with_bars("000858.SZ", &[0.0, 50.0]),
        );

        assert_eq!(service.estimate_growth("白酒", 252).await, DEFAULT_GROWTH);
    }

    #[tokio::test]
    async fn test_query_metrics_short_circuits_on_unknown_industry() {
        let (service, provider) = service(FakeProvider::default().with_stock("000001.SZ", "银行"));

        let metrics = service.query_metrics("600519").await;

        assert_eq!(metrics, IndustryMetrics::fallback("600519"));
        assert_eq!(provider.daily_basic_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.daily_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_metrics_combines_all_estimates() {
        let (service, _) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_snapshot("600519.SH", Some(30.0), Some(9.0))
                .with_bars("600519.SH", &[100.0, 110.0]),
        );

        let metrics = service.query_metrics("600519").await;

        assert_eq!(metrics.industry, "白酒");
        assert_eq!(metrics.industry_avg_pe, 30.0);
        assert_eq!(metrics.industry_avg_pb, 9.0);
        assert_eq!(metrics.industry_growth, 0.1);
    }

    #[tokio::test]
    async fn test_query_metrics_is_idempotent_within_ttl() {
        let (service, provider) = service(
            FakeProvider::default()
                .with_stock("600519.SH", "白酒")
                .with_snapshot("600519.SH", Some(30.0), Some(9.0))
                .with_bars("600519.SH", &[100.0, 110.0]),
        );

        let first = service.query_metrics("600519").await;
        let calls_after_first = (
            provider.stock_basic_calls.load(Ordering::SeqCst),
            provider.daily_basic_calls.load(Ordering::SeqCst),
            provider.daily_calls.load(Ordering::SeqCst),
        );

        let second = service.query_metrics("600519").await;

        assert_eq!(first, second);
        assert_eq!(
            calls_after_first,
            (
                provider.stock_basic_calls.load(Ordering::SeqCst),
                provider.daily_basic_calls.load(Ordering::SeqCst),
                provider.daily_calls.load(Ordering::SeqCst),
            )
        );
    }
}
