use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 交易所限速要求的最小请求间隔（秒）
pub const MIN_REQUEST_INTERVAL_SECS: u64 = 2;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub backfill: BackfillConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// 行情接口根地址，不含末尾斜杠
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    pub request_interval_secs: u64,
    pub max_backfill_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
}

impl BackfillConfig {
    /// # Summary
    /// 返回实际生效的请求间隔。
    ///
    /// # Logic
    /// 1. 配置值低于交易所限速下限时，按下限处理。
    ///
    /// # Returns
    /// 不小于 `MIN_REQUEST_INTERVAL_SECS` 的时长。
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_secs.max(MIN_REQUEST_INTERVAL_SECS))
    }

    /// 单次运行允许回填的最大跨度
    pub fn max_backfill(&self) -> chrono::Duration {
        chrono::Duration::days(self.max_backfill_days.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                endpoint: "https://api.pro.coinbase.com".to_string(),
                timeout_secs: 10,
                user_agent: concat!("candle-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            },
            backfill: BackfillConfig {
                request_interval_secs: MIN_REQUEST_INTERVAL_SECS,
                max_backfill_days: 365,
            },
            dataset: DatasetConfig {
                path: "data/candles.csv".to_string(),
            },
        }
    }
}
