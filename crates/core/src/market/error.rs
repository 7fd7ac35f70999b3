use chrono::{DateTime, Utc};
use thiserror::Error;

/// # Summary
/// 单个窗口的抓取失败，循环内就地恢复，不向上传播。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum FeedError {
    // 网络层错误，包含连接失败与超时
    #[error("Network error: {0}")]
    Network(String),
    // 非 2xx 状态码
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    // JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 接口返回了非行数据的载荷
    #[error("API error payload: {0}")]
    Api(String),
}

/// # Summary
/// 环境级错误，中止整次运行并交由调用方处理。
#[derive(Error, Debug)]
pub enum BackfillError {
    /// 数据集中的最后时间晚于当前时钟
    #[error("Cursor {cursor} is ahead of the clock ({now})")]
    CursorAhead {
        cursor: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}
