use crate::errors::{Result, IndustryHubError};
use log::{error, info, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// 重试间隔的抖动范围（秒）
const MIN_RETRY_DELAY_SECS: f64 = 1.0;
const MAX_RETRY_DELAY_SECS: f64 = 3.0;

/// 通用的远程数据获取函数，带重试机制
///
/// 空结果视为一次失败，重试之间随机等待1~3秒。
/// 配置错误不可重试，立即返回None。
/// 全部重试失败后返回None，调用方必须将其视为无数据而非零值。
pub async fn fetch_with_retry<T, F, Fut>(op: &str, max_retries: u32, mut fetch: F) -> Option<Vec<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    for attempt in 0..max_retries {
        match fetch().await {
            Ok(rows) if !rows.is_empty() => return Some(rows),
            Ok(_) => {
                warn!("Attempt {}: empty result for {}", attempt + 1, op);
            }
            Err(IndustryHubError::ConfigError(msg)) => {
                error!("{} 配置错误，不再重试: {}", op, msg);
                return None;
            }
            Err(e) => {
                warn!("Attempt {} failed for {}: {}", attempt + 1, op, e);
            }
        }

        if attempt + 1 < max_retries {
            let delay = rand::thread_rng().gen_range(MIN_RETRY_DELAY_SECS..MAX_RETRY_DELAY_SECS);
            info!("等待 {:.2} 秒后重试...", delay);
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }

    error!("All {} attempts failed for {}", max_retries, op);
    None
}
