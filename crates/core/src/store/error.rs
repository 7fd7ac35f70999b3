use thiserror::Error;

/// # Summary
/// 数据集存储错误枚举，处理文件读写与列约定问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 文件读写失败
    #[error("IO error: {0}")]
    Io(String),
    /// CSV 编解码失败
    #[error("CSV error: {0}")]
    Csv(String),
    /// 缺少必需的列
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    /// 数据集中没有任何数据行
    #[error("Dataset is empty")]
    Empty,
    /// 时间戳无法转换为 UTC 时间
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    /// 既有文件的列与输出列不一致
    #[error("Header mismatch: dataset has [{0}]")]
    HeaderMismatch(String),
}
