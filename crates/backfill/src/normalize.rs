use candle_sync_core::common::Symbol;
use candle_sync_core::market::entity::{Candle, NormalizedSeries, RawBatch, SeriesRow};
use chrono::DateTime;
use tracing::{debug, warn};

/// # Summary
/// 将按窗口收集的原始响应整理为有序、去重的时间序列。
///
/// # Logic
/// 1. 展开所有行序列，跳过失败占位与非行载荷。
/// 2. 按 `unix_timestamp` 稳定升序排序。
/// 3. 丢弃排序后的第一行，它与既有数据集的最后一行重合。
/// 4. 相同时间戳只保留排序后的第一行。
/// 5. 由时间戳推导 UTC 日期并附加交易对列。
///
/// # Arguments
/// * `batches`: 抓取循环产出的原始响应。
/// * `symbol`: 数据集的交易对。
///
/// # Returns
/// 归一化后的 `NormalizedSeries`；输入相同则输出相同。
pub fn normalize(batches: &[RawBatch], symbol: &Symbol) -> NormalizedSeries {
    let mut candles: Vec<&Candle> = batches
        .iter()
        .filter_map(RawBatch::rows)
        .flatten()
        .collect();
    debug!(rows = candles.len(), "Flattened raw batches");

    candles.sort_by_key(|c| c.unix_timestamp);
    if !candles.is_empty() {
        candles.remove(0);
    }
    candles.dedup_by_key(|c| c.unix_timestamp);

    let rows = candles
        .into_iter()
        .filter_map(|c| {
            let Some(date) = DateTime::from_timestamp(c.unix_timestamp, 0) else {
                warn!(ts = c.unix_timestamp, "Dropping candle with out-of-range timestamp");
                return None;
            };
            Some(SeriesRow {
                unix_timestamp: c.unix_timestamp,
                low: c.low,
                high: c.high,
                open: c.open,
                close: c.close,
                volume: c.volume,
                date,
                symbol: symbol.clone(),
            })
        })
        .collect();

    NormalizedSeries::from_sorted(rows)
}
