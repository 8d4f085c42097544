// 公开导出的模块，供外部使用
pub mod models;
pub mod provider;
pub mod cache;
pub mod services;
pub mod config;
pub mod errors;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::industry::{IndustryMetrics, StockBasic, DailyBasic, DailyBar};
pub use provider::base::DataProvider;
pub use provider::tushare::TuShareProvider;
pub use cache::{FileCache, MemoryCache, MetricsCache};
pub use services::metrics_service::IndustryMetricsService;
pub use config::Config;
pub use errors::{Result, IndustryHubError};
