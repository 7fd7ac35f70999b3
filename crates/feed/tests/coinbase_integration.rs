use candle_sync_core::common::Symbol;
use candle_sync_core::config::AppConfig;
use candle_sync_core::market::entity::FetchWindow;
use candle_sync_core::market::port::CandleFeed;
use candle_sync_feed::coinbase::CoinbaseProvider;
use chrono::{Duration, DurationRound, Utc};

/// # Summary
/// Coinbase 真实接口抓取的集成测试。
///
/// # Logic
/// 1. 以默认配置初始化 CoinbaseProvider。
/// 2. 抓取 BTC-USD 最近一小时的一分钟 K 线。
/// 3. 断言返回非空且每行时间戳落在窗口内。
#[tokio::test]
#[ignore = "hits the live Coinbase endpoint"]
async fn test_coinbase_real_fetch() -> anyhow::Result<()> {
    let provider = CoinbaseProvider::new(&AppConfig::default().feed)?;
    let end = Utc::now().duration_trunc(Duration::minutes(1))?;
    let window = FetchWindow::minute(end - Duration::hours(1), end);

    let candles = provider
        .fetch_candles(&window, &Symbol::from("BTC-USD"))
        .await?;

    assert!(!candles.is_empty(), "Candles list should not be empty");
    for candle in &candles {
        assert!(candle.unix_timestamp >= window.start.timestamp());
        assert!(candle.unix_timestamp <= window.end.timestamp());
    }
    println!("Successfully fetched {} candles for BTC-USD", candles.len());
    Ok(())
}
