use crate::common::Symbol;
use crate::market::entity::{Candle, FetchWindow};
use crate::market::error::FeedError;
use async_trait::async_trait;
use std::time::Duration;

/// # Summary
/// K 线数据源接口（单窗口抓取）。
///
/// # Invariants
/// - 每次调用至多发起一次外部请求。
/// - 实现者不负责限速，由调用方控制节奏。
#[async_trait]
pub trait CandleFeed: Send + Sync {
    /// # Summary
    /// 获取指定交易对在一个时间窗口内的 K 线。
    ///
    /// # Logic
    /// 1. 按窗口起止时间与粒度构建请求。
    /// 2. 执行网络请求并解析行数组。
    ///
    /// # Arguments
    /// * `window`: 时间窗口。
    /// * `symbol`: 交易对。
    ///
    /// # Returns
    /// 成功返回原始顺序的 K 线列表，任何失败都以 `FeedError` 表示。
    async fn fetch_candles(
        &self,
        window: &FetchWindow,
        symbol: &Symbol,
    ) -> Result<Vec<Candle>, FeedError>;
}

/// # Summary
/// 请求节奏控制器，负责两次请求之间的暂停。
///
/// # Invariants
/// - 暂停必须让出执行权，不得忙等。
#[async_trait]
pub trait Pacer: Send + Sync {
    /// 暂停指定时长
    async fn pause(&self, delay: Duration);
}
