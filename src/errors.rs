use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndustryHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, IndustryHubError>;

// 用于从字符串创建错误
impl From<String> for IndustryHubError {
    fn from(s: String) -> Self {
        IndustryHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for IndustryHubError {
    fn from(s: &str) -> Self {
        IndustryHubError::Unknown(s.to_string())
    }
}
