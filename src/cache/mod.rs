use crate::errors::{Result, IndustryHubError};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 缓存条目，记录写入时间用于TTL判断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub saved_at: DateTime<Utc>,
    pub value: serde_json::Value,
}

/// 缓存接口，按字符串键存取任意可序列化的值
pub trait MetricsCache: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>>;
    fn store(&self, key: &str, entry: &CacheEntry) -> Result<()>;
}

/// 读取缓存，过期或缺失时执行compute并回写
///
/// TTL以天为单位，支持小数（0.04天约为1小时）。
/// 缓存损坏时重新计算，回写失败只记录告警，不影响返回值。
pub async fn get_or_compute<T, F, Fut>(
    cache: &dyn MetricsCache,
    key: &str,
    ttl_days: f64,
    compute: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let ttl = Duration::milliseconds((ttl_days * 86_400_000.0) as i64);

    match cache.load(key) {
        Ok(Some(entry)) if Utc::now() - entry.saved_at <= ttl => {
            match serde_json::from_value::<T>(entry.value) {
                Ok(value) => {
                    debug!("缓存命中: {}", key);
                    return Ok(value);
                }
                Err(e) => {
                    warn!("缓存条目 {} 无法解析，重新计算: {}", key, e);
                }
            }
        }
        Ok(Some(_)) => {
            debug!("缓存已过期: {}", key);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("读取缓存 {} 失败，重新计算: {}", key, e);
        }
    }

    let value = compute().await?;

    let entry = CacheEntry {
        saved_at: Utc::now(),
        value: serde_json::to_value(&value)?,
    };
    if let Err(e) = cache.store(key, &entry) {
        warn!("写入缓存 {} 失败: {}", key, e);
    }

    Ok(value)
}

/// 文件缓存，每个键对应缓存目录下的一个JSON文件
pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    /// 创建文件缓存，目录不存在时自动创建
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir)?;

        Ok(Self { cache_dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl MetricsCache for FileCache {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let entry: CacheEntry = serde_json::from_str(&json)
            .map_err(|e| IndustryHubError::CacheError(format!("缓存文件 {} 解析失败: {}", path.display(), e)))?;

        Ok(Some(entry))
    }

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(key);
        let json = serde_json::to_string_pretty(entry)?;
        std::fs::write(&path, json)?;

        Ok(())
    }
}

/// 内存缓存，用于嵌入场景和测试
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }
}

// 键中的路径分隔符等字符不能出现在文件名里
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            c => c,
        })
        .collect()
}
