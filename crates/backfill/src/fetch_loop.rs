use crate::normalize::normalize;
use crate::planner::next_window;
use candle_sync_core::common::Symbol;
use candle_sync_core::common::time::TimeProvider;
use candle_sync_core::config::{BackfillConfig, MIN_REQUEST_INTERVAL_SECS};
use candle_sync_core::market::entity::{FetchOutcome, NormalizedSeries, RawBatch, TimeCursor};
use candle_sync_core::market::error::BackfillError;
use candle_sync_core::market::port::{CandleFeed, Pacer};
use candle_sync_core::store::port::DatasetTail;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 剩余间隔低于该值（秒）即视为已追上实时
pub const CATCH_UP_THRESHOLD_SECS: i64 = 60;

/// # Summary
/// 抓取循环的运行参数。
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    // 两次请求之间的最小间隔
    pub request_interval: std::time::Duration,
    // 相对初始游标的最大回填跨度
    pub max_backfill: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            request_interval: std::time::Duration::from_secs(MIN_REQUEST_INTERVAL_SECS),
            max_backfill: Duration::days(365),
        }
    }
}

impl From<&BackfillConfig> for LoopSettings {
    fn from(config: &BackfillConfig) -> Self {
        Self {
            request_interval: config.request_interval(),
            max_backfill: config.max_backfill(),
        }
    }
}

/// # Summary
/// 增量抓取循环，驱动窗口规划与单窗口抓取直到追上实时或触达回填上限。
///
/// # Invariants
/// - 严格串行：每轮至多一次请求，随后一次节奏暂停。
/// - 游标单调不减，且不会越过 `初始游标 + max_backfill`。
/// - 单个窗口失败只记录占位，不会中止循环，也不会在本次运行中重试。
pub struct FetchLoop {
    feed: Arc<dyn CandleFeed>,
    clock: Arc<dyn TimeProvider>,
    pacer: Arc<dyn Pacer>,
    settings: LoopSettings,
}

impl FetchLoop {
    pub fn new(
        feed: Arc<dyn CandleFeed>,
        clock: Arc<dyn TimeProvider>,
        pacer: Arc<dyn Pacer>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            feed,
            clock,
            pacer,
            settings,
        }
    }

    /// # Summary
    /// 从游标位置开始循环抓取。
    ///
    /// # Logic
    /// 1. 游标晚于当前时钟时直接返回环境错误。
    /// 2. 剩余间隔不小于一分钟且游标未到回填上限时持续迭代：
    ///    重新读取时钟，以 `min(当前时间, 上限)` 规划窗口，抓取并记录结果。
    /// 3. 无论成功失败，游标都推进到窗口终点，保证有限步内结束。
    /// 4. 每次请求后按配置间隔暂停。
    ///
    /// # Arguments
    /// * `cursor`: 调用方交给循环独占修改的游标。
    /// * `symbol`: 交易对。
    ///
    /// # Returns
    /// 成功返回 `FetchOutcome`，仅环境错误会返回 `BackfillError`。
    pub async fn run(
        &self,
        cursor: &mut TimeCursor,
        symbol: &Symbol,
    ) -> Result<FetchOutcome, BackfillError> {
        let origin = cursor.last_time();
        let deadline = origin + self.settings.max_backfill;
        let threshold = Duration::seconds(CATCH_UP_THRESHOLD_SECS);

        let mut now = self.clock.now();
        if origin > now {
            return Err(BackfillError::CursorAhead {
                cursor: origin,
                now,
            });
        }

        let mut batches = Vec::new();
        let mut failures = 0;

        while now - cursor.last_time() >= threshold && cursor.last_time() < deadline {
            info!(cursor = %cursor.last_time().to_rfc3339(), %symbol, "Fetching next window");

            now = self.clock.now();
            if cursor.last_time() > now {
                return Err(BackfillError::CursorAhead {
                    cursor: cursor.last_time(),
                    now,
                });
            }

            let window = next_window(cursor.last_time(), now.min(deadline));
            match self.feed.fetch_candles(&window, symbol).await {
                Ok(rows) => {
                    debug!(rows = rows.len(), end = %window.end.to_rfc3339(), "Window fetched");
                    batches.push(RawBatch::Rows(rows));
                }
                Err(e) => {
                    warn!(
                        start = %window.start.to_rfc3339(),
                        end = %window.end.to_rfc3339(),
                        error = %e,
                        "FETCH FAILED - no data response for window"
                    );
                    failures += 1;
                    batches.push(RawBatch::Failed);
                }
            }
            cursor.advance_to(window.end);

            self.pacer.pause(self.settings.request_interval).await;
        }

        Ok(FetchOutcome {
            requests: batches.len(),
            batches,
            final_cursor: *cursor,
            failures,
        })
    }

    /// # Summary
    /// 从既有数据集尾部增量抓取并整理出新数据。
    ///
    /// # Logic
    /// 1. 以数据集最后时间初始化游标并运行循环。
    /// 2. 将原始响应交给归一化步骤。
    ///
    /// # Returns
    /// 可直接追加到数据集的 `NormalizedSeries`。
    pub async fn catch_up(&self, tail: &DatasetTail) -> Result<NormalizedSeries, BackfillError> {
        let mut cursor = TimeCursor::new(tail.last_time);
        let outcome = self.run(&mut cursor, &tail.symbol).await?;
        let series = normalize(&outcome.batches, &tail.symbol);
        info!(
            symbol = %tail.symbol,
            requests = outcome.requests,
            failures = outcome.failures,
            rows = series.len(),
            cursor = %outcome.final_cursor.last_time().to_rfc3339(),
            "Catch-up finished"
        );
        Ok(series)
    }
}
