/// 服务配置，token等凭证通过注入方式传入，不使用全局变量
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub max_retries: u32,
    pub cache_dir: String,
    pub request_timeout_secs: u64,
    /// 估值计算的成分股数量上限
    pub valuation_sample_limit: usize,
    /// 涨幅计算的成分股数量上限
    pub growth_sample_limit: usize,
    /// 基本面数据单次请求的股票数量上限
    pub fundamental_batch_size: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            token: String::new(),
            api_url: "http://api.tushare.pro".to_string(),
            max_retries: 3,
            cache_dir: "cache".to_string(),
            request_timeout_secs: 30,
            valuation_sample_limit: 50,
            growth_sample_limit: 20,
            fundamental_batch_size: 50,
        }
    }

    /// 从环境变量读取token创建配置
    pub fn from_env() -> Self {
        let token = std::env::var("TUSHARE_TOKEN").unwrap_or_default();
        Self::new().with_token(&token)
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_cache_dir(mut self, dir: &str) -> Self {
        self.cache_dir = dir.to_string();
        self
    }

    pub fn with_valuation_sample_limit(mut self, limit: usize) -> Self {
        self.valuation_sample_limit = limit;
        self
    }

    pub fn with_growth_sample_limit(mut self, limit: usize) -> Self {
        self.growth_sample_limit = limit;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
