use industryhub::cache::FileCache;
use industryhub::config::Config;
use industryhub::provider::tushare::TuShareProvider;
use industryhub::services::metrics_service::IndustryMetricsService;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // token从TUSHARE_TOKEN环境变量读取
    let config = Config::from_env();

    // 创建数据提供者和缓存
    let provider = Arc::new(TuShareProvider::new(&config)?);
    let cache = Arc::new(FileCache::new(&config.cache_dir)?);
    let service = IndustryMetricsService::new(config, provider, cache);

    // 综合查询一只股票的行业指标
    let metrics = service.query_metrics("600519").await;

    println!("股票: {}", metrics.stock);
    println!("行业: {}", metrics.industry);
    println!("行业平均PE: {:.2}", metrics.industry_avg_pe);
    println!("行业平均PB: {:.2}", metrics.industry_avg_pb);
    println!("行业近一年涨幅: {:.2}%", metrics.industry_growth * 100.0);

    Ok(())
}
