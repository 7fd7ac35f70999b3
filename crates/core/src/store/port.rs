use super::error::StoreError;
use crate::common::Symbol;
use crate::market::entity::NormalizedSeries;
use chrono::{DateTime, Utc};

/// # Summary
/// 既有数据集的尾部信息，即增量抓取的起点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetTail {
    // 最后一行的时间
    pub last_time: DateTime<Utc>,
    // 数据集对应的交易对（整列恒定）
    pub symbol: Symbol,
}

/// # Summary
/// 历史数据集存储契约。
///
/// # Invariants
/// - 数据集按时间升序排列，至少包含 `Unix Timestamp` 与 `Symbol` 两列。
pub trait DatasetStore: Send + Sync {
    /// # Summary
    /// 读取数据集尾部信息。
    ///
    /// # Returns
    /// 成功返回 `DatasetTail`；数据集缺失、缺列或为空时返回 `StoreError`。
    fn load_tail(&self) -> Result<DatasetTail, StoreError>;

    /// # Summary
    /// 将归一化后的新数据追加到数据集末尾。
    ///
    /// # Returns
    /// 成功返回写入的行数。
    fn append(&self, series: &NormalizedSeries) -> Result<usize, StoreError>;
}
