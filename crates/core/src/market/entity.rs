use crate::common::{GRANULARITY_SECS, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根一分钟 K 线，直接由交易所返回的行数组解析而来。
///
/// # Invariants
/// - 接收后不可变。
/// - 线上格式为 `[unix_timestamp, low, high, open, close, volume]`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRow", into = "WireRow")]
pub struct Candle {
    // K 线开始时间（Unix 秒）
    pub unix_timestamp: i64,
    pub low: Decimal,
    pub high: Decimal,
    pub open: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// 交易所的行数组编码
#[derive(Serialize, Deserialize)]
struct WireRow(i64, Decimal, Decimal, Decimal, Decimal, Decimal);

impl From<WireRow> for Candle {
    fn from(WireRow(unix_timestamp, low, high, open, close, volume): WireRow) -> Self {
        Self {
            unix_timestamp,
            low,
            high,
            open,
            close,
            volume,
        }
    }
}

impl From<Candle> for WireRow {
    fn from(c: Candle) -> Self {
        WireRow(c.unix_timestamp, c.low, c.high, c.open, c.close, c.volume)
    }
}

/// # Summary
/// 单个时间窗口的原始响应，按 JSON 形状区分。
///
/// # Invariants
/// - 只有 `Rows` 参与归一化，其余形状一律跳过。
/// - `Failed` 是抓取失败时由循环写入的占位（序列化为 `null`）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBatch {
    // 完整的行序列
    Rows(Vec<Candle>),
    // 抓取失败的占位
    Failed,
    // 首元素不是行的接口载荷（例如错误码）
    Rejected(serde_json::Value),
}

impl RawBatch {
    /// 若为合法行序列则返回其中的 K 线
    pub fn rows(&self) -> Option<&[Candle]> {
        match self {
            RawBatch::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// # Summary
/// 单次请求的时间窗口。
///
/// # Invariants
/// - `start <= end`，且跨度不超过单次请求允许的最大跨度。
/// - 仅在一次循环迭代内有效，不做持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity_secs: i64,
}

impl FetchWindow {
    /// 以固定的一分钟粒度构造窗口
    pub fn minute(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            granularity_secs: GRANULARITY_SECS,
        }
    }

    pub fn span(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// # Summary
/// 抓取游标，记录已抓取到的最新时间。
///
/// # Invariants
/// - 由抓取循环独占持有。
/// - 单调不减，永不回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCursor {
    last_time: DateTime<Utc>,
}

impl TimeCursor {
    pub fn new(last_time: DateTime<Utc>) -> Self {
        Self { last_time }
    }

    pub fn last_time(&self) -> DateTime<Utc> {
        self.last_time
    }

    /// # Summary
    /// 将游标推进到指定时间。
    ///
    /// # Logic
    /// 1. 目标时间早于当前位置时忽略，保持单调性。
    pub fn advance_to(&mut self, time: DateTime<Utc>) {
        if time > self.last_time {
            self.last_time = time;
        }
    }
}

/// # Summary
/// 归一化后的单行数据，列名与外部数据集一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    #[serde(rename = "Unix Timestamp")]
    pub unix_timestamp: i64,
    #[serde(rename = "Low")]
    pub low: Decimal,
    #[serde(rename = "High")]
    pub high: Decimal,
    #[serde(rename = "Open")]
    pub open: Decimal,
    #[serde(rename = "Close")]
    pub close: Decimal,
    #[serde(rename = "Volume")]
    pub volume: Decimal,
    // 由时间戳推导的 UTC 时间
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Symbol")]
    pub symbol: Symbol,
}

/// # Summary
/// 最终输出的时间序列。
///
/// # Invariants
/// - 按 `unix_timestamp` 严格升序，无重复时间戳。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    rows: Vec<SeriesRow>,
}

impl NormalizedSeries {
    /// 由已排序去重的行构造，调用方负责保证不变量
    pub fn from_sorted(rows: Vec<SeriesRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// # Summary
/// 一次抓取循环的完整产出。
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    // 按窗口顺序排列的原始响应
    pub batches: Vec<RawBatch>,
    // 循环结束时的游标
    pub final_cursor: TimeCursor,
    pub requests: usize,
    pub failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_candle_parses_from_wire_row() {
        let candle: Candle =
            serde_json::from_str("[1577836800, 7150.5, 7160.25, 7151, 7155.75, 12.034]").unwrap();
        assert_eq!(candle.unix_timestamp, 1_577_836_800);
        assert_eq!(candle.low, dec!(7150.5));
        assert_eq!(candle.high, dec!(7160.25));
        assert_eq!(candle.open, dec!(7151));
        assert_eq!(candle.close, dec!(7155.75));
        assert_eq!(candle.volume, dec!(12.034));
    }

    #[test]
    fn test_raw_batch_shapes() {
        let batches: Vec<RawBatch> =
            serde_json::from_str("[[[1000, 1, 2, 1.5, 1.8, 3]], [101], null, []]").unwrap();
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].rows().map(<[Candle]>::len), Some(1));
        assert!(matches!(batches[1], RawBatch::Rejected(_)));
        assert_eq!(batches[2], RawBatch::Failed);
        assert_eq!(batches[3].rows().map(<[Candle]>::len), Some(0));
    }

    #[test]
    fn test_error_object_is_rejected() {
        let batch: RawBatch = serde_json::from_str(r#"{"message": "Invalid start"}"#).unwrap();
        assert!(batch.rows().is_none());
    }

    #[test]
    fn test_cursor_never_moves_backwards() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut cursor = TimeCursor::new(t0);
        cursor.advance_to(t0 + Duration::minutes(5));
        cursor.advance_to(t0);
        assert_eq!(cursor.last_time(), t0 + Duration::minutes(5));
    }
}
