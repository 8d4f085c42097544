use serde::{Deserialize, Serialize};

/// 行业无法识别时返回的哨兵值
pub const UNKNOWN_INDUSTRY: &str = "未知行业";

/// 行业估值的兜底默认值
pub const DEFAULT_PE: f64 = 15.0;
pub const DEFAULT_PB: f64 = 1.5;

/// 行业涨幅的兜底默认值
pub const DEFAULT_GROWTH: f64 = 0.05;

/// 默认的涨幅统计窗口（交易日）
pub const DEFAULT_GROWTH_WINDOW: usize = 252;

/// 股票基础信息（含行业分类）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBasic {
    pub ts_code: String,
    pub symbol: String,
    pub name: String,
    pub industry: String,
}

/// 每日基本面快照，估值字段缺失时为None
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBasic {
    pub ts_code: String,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
}

/// 日线行情数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub ts_code: String,
    pub trade_date: i32,
    pub close: f64,
}

/// 行业指标查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryMetrics {
    pub stock: String,
    pub industry: String,
    pub industry_avg_pe: f64,
    pub industry_avg_pb: f64,
    pub industry_growth: f64,
}

impl IndustryMetrics {
    /// 构造全默认值的结果，用于行业无法识别或查询整体失败的情况
    pub fn fallback(stock: &str) -> Self {
        Self {
            stock: stock.to_string(),
            industry: UNKNOWN_INDUSTRY.to_string(),
            industry_avg_pe: DEFAULT_PE,
            industry_avg_pb: DEFAULT_PB,
            industry_growth: DEFAULT_GROWTH,
        }
    }
}
