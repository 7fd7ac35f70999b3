use async_trait::async_trait;
use candle_sync_core::common::Symbol;
use candle_sync_core::config::FeedConfig;
use candle_sync_core::market::entity::{Candle, FetchWindow, RawBatch};
use candle_sync_core::market::error::FeedError;
use candle_sync_core::market::port::CandleFeed;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// Coinbase 行情 K 线接口的实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
/// - 每次 `fetch_candles` 恰好发起一次请求，不做重试与限速。
#[derive(Clone)]
pub struct CoinbaseProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// 接口根地址，不含末尾斜杠
    endpoint: String,
}

impl CoinbaseProvider {
    /// # Summary
    /// 创建一个新的 CoinbaseProvider 实例。
    ///
    /// # Logic
    /// 1. 安装 rustls 加密后端（已安装时跳过）。
    /// 2. 按配置设置超时与 User-Agent，交易所会拒绝匿名客户端。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `config`: 行情源配置。
    ///
    /// # Returns
    /// 成功返回 CoinbaseProvider，客户端构建失败返回 `FeedError::Network`。
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// 交易对 K 线资源地址
    pub fn candles_url(&self, symbol: &Symbol) -> String {
        format!("{}/products/{}/candles", self.endpoint, symbol)
    }
}

/// # Summary
/// 按接口要求格式化 UTC 时间：ISO 8601，不带时区后缀。
///
/// # Logic
/// 1. 精度截断到微秒。
/// 2. 不足一微秒时省略小数部分，否则固定输出 6 位小数。
pub fn format_api_time(time: DateTime<Utc>) -> String {
    let naive = time.naive_utc();
    if time.timestamp_subsec_micros() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// # Summary
/// 解析单个窗口的响应体。
///
/// # Logic
/// 1. 按形状解析为 `RawBatch`。
/// 2. 仅行序列视为成功，其余形状（错误码、错误对象、null）视为接口错误。
///
/// # Returns
/// 成功返回 K 线列表，失败返回 `FeedError::Parse` 或 `FeedError::Api`。
pub fn parse_candles(body: &str) -> Result<Vec<Candle>, FeedError> {
    let batch: RawBatch =
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;
    match batch {
        RawBatch::Rows(rows) => Ok(rows),
        RawBatch::Failed => Err(FeedError::Api("null".to_string())),
        RawBatch::Rejected(payload) => Err(FeedError::Api(payload.to_string())),
    }
}

#[async_trait]
impl CandleFeed for CoinbaseProvider {
    /// # Summary
    /// 从 Coinbase 抓取一个窗口的一分钟 K 线。
    ///
    /// # Logic
    /// 1. 构建 `/products/{symbol}/candles` 地址与 granularity/start/end 查询参数。
    /// 2. 发起请求，非 2xx 状态直接返回错误。
    /// 3. 解析行数组。
    async fn fetch_candles(
        &self,
        window: &FetchWindow,
        symbol: &Symbol,
    ) -> Result<Vec<Candle>, FeedError> {
        let url = self.candles_url(symbol);
        let start = format_api_time(window.start);
        let end = format_api_time(window.end);
        debug!(%url, %start, %end, "Requesting candles");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("granularity", window.granularity_secs.to_string()),
                ("start", start),
                ("end", end),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;
        let candles = parse_candles(&body)?;
        debug!(rows = candles.len(), "Received candles");
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_sync_core::config::AppConfig;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_api_time_has_no_offset() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 4, 59, 0).unwrap();
        assert_eq!(format_api_time(t), "2020-01-01T04:59:00");

        let with_micros = t + chrono::Duration::microseconds(250_000);
        assert_eq!(format_api_time(with_micros), "2020-01-01T04:59:00.250000");
    }

    #[test]
    fn test_format_api_time_truncates_to_micros() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 9, 58, 0).unwrap();
        let with_nanos = t + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(format_api_time(with_nanos), "2020-01-01T09:58:00.123456");

        let sub_micro = t + chrono::Duration::nanoseconds(500);
        assert_eq!(format_api_time(sub_micro), "2020-01-01T09:58:00");
    }

    #[test]
    fn test_candles_url_trims_trailing_slash() {
        let mut config = AppConfig::default().feed;
        config.endpoint = "https://example.test/".to_string();
        let provider = CoinbaseProvider::new(&config).unwrap();
        assert_eq!(
            provider.candles_url(&Symbol::from("BTC-USD")),
            "https://example.test/products/BTC-USD/candles"
        );
    }

    #[test]
    fn test_parse_candles_rows() {
        let body = "[[1577837100, 7160, 7170, 7161, 7165, 1.5], [1577837040, 7150, 7162, 7151, 7160, 2.25]]";
        let candles = parse_candles(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].unix_timestamp, 1_577_837_100);
        assert_eq!(candles[1].volume, dec!(2.25));
    }

    #[test]
    fn test_parse_candles_error_payloads() {
        assert!(matches!(parse_candles("[101]"), Err(FeedError::Api(_))));
        assert!(matches!(
            parse_candles(r#"{"message":"NotFound"}"#),
            Err(FeedError::Api(_))
        ));
        assert!(matches!(parse_candles("null"), Err(FeedError::Api(_))));
        assert!(matches!(parse_candles("<html>"), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_parse_candles_empty_window() {
        assert!(parse_candles("[]").unwrap().is_empty());
    }
}
