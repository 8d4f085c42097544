use crate::models::industry::{StockBasic, DailyBasic, DailyBar};
use crate::errors::{Result, IndustryHubError};
use crate::config::Config;
use crate::provider::base::DataProvider;
use crate::util;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// TuShare Pro数据提供者
///
/// 所有接口走统一的HTTP入口，请求体为
/// `{api_name, token, params, fields}`，响应体为
/// `{code, msg, data: {fields, items}}`。
pub struct TuShareProvider {
    client: Client,
    token: String,
    api_url: String,
    last_request: Mutex<Option<Instant>>,
}

impl TuShareProvider {
    /// 创建新的TuShare数据提供者，token为空视为配置错误
    pub fn new(config: &Config) -> Result<Self> {
        if config.token.is_empty() {
            return Err(IndustryHubError::ConfigError("TuShare token not found".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(IndustryHubError::RequestError)?;

        Ok(Self {
            client,
            token: config.token.clone(),
            api_url: config.api_url.clone(),
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        const MIN_INTERVAL: Duration = Duration::from_millis(500);

        let now = Instant::now();
        let should_wait = {
            let mut last = self.last_request.lock().unwrap();
            let should_wait = if let Some(instant) = *last {
                let elapsed = instant.elapsed();
                if elapsed < MIN_INTERVAL {
                    Some(MIN_INTERVAL - elapsed)
                } else {
                    None
                }
            } else {
                None
            };
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("等待 {:?} 以遵守频率限制", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// 调用TuShare接口，返回表格形式的结果
    async fn call_api(&self, api_name: &str, params: Value, fields: &str) -> Result<ResponseTable> {
        // 限制请求频率
        self.wait_for_rate_limit().await;

        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        let response = self.client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(IndustryHubError::RequestError)?;

        let payload: Value = response.json().await?;
        debug!("成功获取 {} 响应", api_name);

        let code = payload.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        if code != 0 {
            let msg = payload
                .get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(IndustryHubError::ProviderError(format!(
                "{} 接口返回错误 (code={}): {}", api_name, code, msg
            )));
        }

        let data = payload
            .get("data")
            .ok_or_else(|| IndustryHubError::DataError(format!("{} 响应缺少data字段", api_name)))?;

        parse_table(data)
    }
}

#[async_trait]
impl DataProvider for TuShareProvider {
    fn provider_name(&self) -> &'static str {
        "tushare"
    }

    async fn fetch_stock_basic(&self) -> Result<Vec<StockBasic>> {
        info!("获取上市股票列表");

        let table = self.call_api(
            "stock_basic",
            json!({ "exchange": "", "list_status": "L" }),
            "ts_code,symbol,name,industry",
        ).await?;

        let stocks = decode_stock_basic(&table);
        info!("成功获取 {} 支股票信息", stocks.len());
        Ok(stocks)
    }

    async fn fetch_daily_basic(&self, ts_codes: &[String]) -> Result<Vec<DailyBasic>> {
        debug!("获取 {} 支股票的基本面快照", ts_codes.len());

        let table = self.call_api(
            "daily_basic",
            json!({ "ts_code": ts_codes.join(",") }),
            "ts_code,pe,pb",
        ).await?;

        Ok(decode_daily_basic(&table))
    }

    async fn fetch_daily(&self, ts_code: &str, start: &NaiveDate, end: &NaiveDate) -> Result<Vec<DailyBar>> {
        debug!("获取股票 {} 的日线数据", ts_code);

        let table = self.call_api(
            "daily",
            json!({
                "ts_code": ts_code,
                "start_date": start.format("%Y%m%d").to_string(),
                "end_date": end.format("%Y%m%d").to_string(),
            }),
            "ts_code,trade_date,close",
        ).await?;

        Ok(decode_daily(&table))
    }
}

/// 表格形式的接口响应，fields为列名，items为行数据
pub struct ResponseTable {
    fields: Vec<String>,
    items: Vec<Value>,
}

impl ResponseTable {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    fn cell<'a>(&self, row: &'a Value, name: &str) -> Option<&'a Value> {
        let idx = self.column_index(name)?;
        row.as_array()?.get(idx)
    }
}

fn parse_table(data: &Value) -> Result<ResponseTable> {
    let fields = data
        .get("fields")
        .and_then(|f| f.as_array())
        .ok_or_else(|| IndustryHubError::DataError("响应缺少fields列表".to_string()))?
        .iter()
        .map(|f| f.as_str().unwrap_or_default().to_string())
        .collect();

    let items = data
        .get("items")
        .and_then(|i| i.as_array())
        .cloned()
        .unwrap_or_default();

    Ok(ResponseTable { fields, items })
}

fn decode_stock_basic(table: &ResponseTable) -> Vec<StockBasic> {
    let mut stocks = Vec::new();

    for row in &table.items {
        let ts_code = match table.cell(row, "ts_code").and_then(|v| v.as_str()) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => continue,
        };

        stocks.push(StockBasic {
            ts_code,
            symbol: table.cell(row, "symbol").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            name: table.cell(row, "name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            // 部分股票无行业分类，保留空字符串
            industry: table.cell(row, "industry").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        });
    }

    stocks
}

fn decode_daily_basic(table: &ResponseTable) -> Vec<DailyBasic> {
    let mut rows = Vec::new();

    for row in &table.items {
        let ts_code = match table.cell(row, "ts_code").and_then(|v| v.as_str()) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => continue,
        };

        rows.push(DailyBasic {
            ts_code,
            pe: table.cell(row, "pe").and_then(|v| v.as_f64()),
            pb: table.cell(row, "pb").and_then(|v| v.as_f64()),
        });
    }

    rows
}

fn decode_daily(table: &ResponseTable) -> Vec<DailyBar> {
    let mut bars = Vec::new();

    for row in &table.items {
        let ts_code = match table.cell(row, "ts_code").and_then(|v| v.as_str()) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => continue,
        };

        // 无法解析为有效交易日的行直接跳过
        let trade_date = match table.cell(row, "trade_date").and_then(|v| v.as_str()) {
            Some(date_str) => match util::date_string_to_int(date_str) {
                Ok(date) if util::int_to_naive_date(date).is_ok() => date,
                _ => continue,
            },
            None => continue,
        };

        let close = match table.cell(row, "close").and_then(|v| v.as_f64()) {
            Some(close) => close,
            None => continue,
        };

        bars.push(DailyBar { ts_code, trade_date, close });
    }

    bars
}
