use async_trait::async_trait;
use candle_sync_core::market::port::Pacer;
use std::time::Duration;

/// # Summary
/// 基于 tokio 定时器的请求节奏控制器，暂停期间让出执行权。
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
