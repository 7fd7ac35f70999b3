use serde::{Deserialize, Serialize};
use std::fmt;

pub mod time;

/// K 线固定粒度（秒），仅支持一分钟。
pub const GRANULARITY_SECS: i64 = 60;

/// # Summary
/// 交易对标识，代表交易所识别的币对代码。
///
/// # Invariants
/// - 形如 `BASE-QUOTE`（例如: BTC-USD），在一次同步中保持不变。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
