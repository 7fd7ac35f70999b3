use candle_sync_core::market::entity::FetchWindow;
use chrono::{DateTime, Duration, Utc};

/// 单次请求允许的最大跨度（秒）：4 小时 59 分，略低于接口每次 300 行的上限。
pub const MAX_WINDOW_SPAN_SECS: i64 = (4 * 60 + 59) * 60;

pub fn max_window_span() -> Duration {
    Duration::seconds(MAX_WINDOW_SPAN_SECS)
}

/// # Summary
/// 计算下一个抓取窗口。
///
/// # Logic
/// 1. 窗口起点恒为 `last_time`。
/// 2. 剩余间隔不小于最大跨度时，终点为 `last_time + 最大跨度`。
/// 3. 否则终点为 `current_time`（追赶窗口）。
///
/// # Arguments
/// * `last_time`: 已抓取到的最新时间。
/// * `current_time`: 当前时间，或循环裁剪后的上限。
///
/// # Returns
/// 一分钟粒度的 `FetchWindow`。
pub fn next_window(last_time: DateTime<Utc>, current_time: DateTime<Utc>) -> FetchWindow {
    let max_span = max_window_span();
    let end = if current_time - last_time >= max_span {
        last_time + max_span
    } else {
        current_time
    };
    FetchWindow::minute(last_time, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_long_gap_is_capped_at_max_span() {
        let current = Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap();
        let window = next_window(t0(), current);
        assert_eq!(window.start, t0());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2020, 1, 1, 4, 59, 0).unwrap());
        assert_eq!(window.granularity_secs, 60);
    }

    #[test]
    fn test_short_gap_ends_at_current_time() {
        let current = t0() + Duration::minutes(42);
        let window = next_window(t0(), current);
        assert_eq!(window.start, t0());
        assert_eq!(window.end, current);
    }

    #[test]
    fn test_gap_exactly_max_span_uses_full_window() {
        let window = next_window(t0(), t0() + max_window_span());
        assert_eq!(window.end, t0() + max_window_span());
    }

    #[test]
    fn test_window_span_never_exceeds_max() {
        for minutes in [0, 1, 59, 298, 299, 300, 600, 10_000, 525_600] {
            let current = t0() + Duration::minutes(minutes);
            let window = next_window(t0(), current);
            assert!(window.span() <= max_window_span(), "gap {minutes}m");
            if Duration::minutes(minutes) >= max_window_span() {
                assert_eq!(window.end, t0() + max_window_span());
            } else {
                assert_eq!(window.end, current);
            }
        }
    }
}
