use std::sync::Arc;

use candle_sync_backfill::fetch_loop::{FetchLoop, LoopSettings};
use candle_sync_backfill::pacer::TokioPacer;
use candle_sync_core::common::time::RealTimeProvider;
use candle_sync_core::config::AppConfig;
use candle_sync_core::store::port::DatasetStore;
use candle_sync_feed::coinbase::CoinbaseProvider;
use candle_sync_store::dataset::CsvDatasetStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "candle-sync.toml";

/// # Summary
/// 加载分层配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为底层。
/// 2. 叠加配置文件（命令行第一个参数，缺省为 `candle-sync.toml`，可不存在）。
/// 3. 叠加 `CANDLE_SYNC__` 前缀的环境变量，例如 `CANDLE_SYNC__DATASET__PATH`。
fn load_config() -> Result<AppConfig, config::ConfigError> {
    let file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    config::Config::builder()
        .add_source(config::Config::try_from(&AppConfig::default())?)
        .add_source(config::File::with_name(&file).required(false))
        .add_source(
            config::Environment::with_prefix("CANDLE_SYNC")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 应用启动入口，负责组装组件并执行一次增量同步。
///
/// # Logic
/// 1. 初始化日志与配置。
/// 2. 读取既有数据集尾部，缺失或格式错误时直接退出。
/// 3. 组装行情源、时钟与节奏控制器，运行抓取循环并归一化。
/// 4. 将新数据追加到数据集。
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化日志
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .init();

    let config = load_config()?;
    info!(endpoint = %config.feed.endpoint, dataset = %config.dataset.path, "Candle sync starting...");

    // 2. 读取数据集尾部
    let store = CsvDatasetStore::new(&config.dataset.path);
    let tail = store.load_tail()?;
    info!(symbol = %tail.symbol, last_time = %tail.last_time.to_rfc3339(), "Resuming from dataset tail");

    // 3. 抓取并归一化
    let feed = Arc::new(CoinbaseProvider::new(&config.feed)?);
    let fetch_loop = FetchLoop::new(
        feed,
        Arc::new(RealTimeProvider),
        Arc::new(TokioPacer),
        LoopSettings::from(&config.backfill),
    );
    let series = fetch_loop.catch_up(&tail).await?;

    // 4. 追加写入
    let written = store.append(&series)?;
    info!(rows = written, "Candle sync finished");

    Ok(())
}
