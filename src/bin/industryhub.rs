use industryhub::cache::FileCache;
use industryhub::config::Config;
use industryhub::provider::tushare::TuShareProvider;
use industryhub::services::metrics_service::IndustryMetricsService;
use industryhub::models::industry::DEFAULT_GROWTH_WINDOW;

use anyhow::{Context, Result};
use clap::{App, Arg, SubCommand};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // 创建基本的命令行应用
    let app = App::new("IndustryHub")
        .version("1.0.0")
        .author("IndustryHub Team")
        .about("Industry classification and valuation metrics for stocks")
        .arg(
            Arg::with_name("token")
                .long("token")
                .value_name("TOKEN")
                .help("TuShare API token (falls back to TUSHARE_TOKEN env var)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .help("Directory for cached API results")
                .takes_value(true)
                .default_value("cache"),
        )
        .arg(
            Arg::with_name("max-retries")
                .long("max-retries")
                .value_name("N")
                .help("Maximum retry attempts per remote call")
                .takes_value(true)
                .default_value("3"),
        );

    // 添加子命令
    let app = app
        .subcommand(
            SubCommand::with_name("query")
                .about("Query all industry metrics for a stock")
                .arg(
                    Arg::with_name("stock")
                        .short('s')
                        .long("stock")
                        .value_name("CODE")
                        .help("Stock code, e.g. 600519")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("industry")
                .about("Resolve the industry label for a stock")
                .arg(
                    Arg::with_name("stock")
                        .short('s')
                        .long("stock")
                        .value_name("CODE")
                        .help("Stock code, e.g. 600519")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("valuation")
                .about("Estimate average P/E and P/B for an industry")
                .arg(
                    Arg::with_name("industry")
                        .short('i')
                        .long("industry")
                        .value_name("INDUSTRY")
                        .help("Industry label, e.g. 白酒")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("growth")
                .about("Estimate the trailing growth rate for an industry")
                .arg(
                    Arg::with_name("industry")
                        .short('i')
                        .long("industry")
                        .value_name("INDUSTRY")
                        .help("Industry label, e.g. 白酒")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("window")
                        .short('w')
                        .long("window")
                        .value_name("DAYS")
                        .help("Trailing window in trading days")
                        .takes_value(true)
                        .default_value("252"),
                ),
        );

    let matches = app.get_matches();

    let max_retries = matches
        .value_of("max-retries")
        .unwrap_or("3")
        .parse::<u32>()
        .unwrap_or(3);
    let cache_dir = matches.value_of("cache-dir").unwrap_or("cache");

    // token优先取命令行参数，其次取环境变量
    let config = match matches.value_of("token") {
        Some(token) => Config::new().with_token(token),
        None => Config::from_env(),
    };
    let config = config
        .with_max_retries(max_retries)
        .with_cache_dir(cache_dir);

    let provider = Arc::new(
        TuShareProvider::new(&config).context("Failed to create TuShare provider")?,
    );
    let cache = Arc::new(
        FileCache::new(&config.cache_dir).context("Failed to create cache directory")?,
    );
    let service = IndustryMetricsService::new(config, provider, cache);

    if let Some(matches) = matches.subcommand_matches("query") {
        let stock = matches.value_of("stock").unwrap();

        let metrics = service.query_metrics(stock).await;
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else if let Some(matches) = matches.subcommand_matches("industry") {
        let stock = matches.value_of("stock").unwrap();

        let industry = service.resolve_industry(stock).await;
        println!("{}", industry);
    } else if let Some(matches) = matches.subcommand_matches("valuation") {
        let industry = matches.value_of("industry").unwrap();

        let (pe, pb) = service.estimate_valuation(industry).await;
        println!("PE={:.4} PB={:.4}", pe, pb);
    } else if let Some(matches) = matches.subcommand_matches("growth") {
        let industry = matches.value_of("industry").unwrap();
        let window = matches
            .value_of("window")
            .unwrap_or("252")
            .parse::<usize>()
            .unwrap_or(DEFAULT_GROWTH_WINDOW);

        let growth = service.estimate_growth(industry, window).await;
        println!("{:.4}", growth);
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
