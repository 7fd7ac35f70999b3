use candle_sync_core::common::Symbol;
use candle_sync_core::market::entity::{NormalizedSeries, SeriesRow};
use candle_sync_core::store::error::StoreError;
use candle_sync_core::store::port::{DatasetStore, DatasetTail};
use chrono::{DateTime, SecondsFormat};
use csv::StringRecord;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TIMESTAMP_COLUMN: &str = "Unix Timestamp";
const SYMBOL_COLUMN: &str = "Symbol";

/// 输出列，新文件按此顺序写入列名
pub const OUTPUT_COLUMNS: [&str; 8] = [
    TIMESTAMP_COLUMN,
    "Low",
    "High",
    "Open",
    "Close",
    "Volume",
    "Date",
    SYMBOL_COLUMN,
];

/// 读取尾部信息时只关心的两列，其余列忽略
#[derive(Deserialize)]
struct TailRecord {
    #[serde(rename = "Unix Timestamp")]
    unix_timestamp: i64,
    #[serde(rename = "Symbol")]
    symbol: String,
}

/// 按 `OUTPUT_COLUMNS` 顺序渲染一行
fn row_fields(row: &SeriesRow) -> [String; 8] {
    [
        row.unix_timestamp.to_string(),
        row.low.to_string(),
        row.high.to_string(),
        row.open.to_string(),
        row.close.to_string(),
        row.volume.to_string(),
        row.date.to_rfc3339_opts(SecondsFormat::Secs, true),
        row.symbol.to_string(),
    ]
}

/// # Summary
/// 将既有文件的列名映射到输出列下标。
///
/// # Logic
/// 1. 列数必须与输出列相同，且每个输出列恰好出现一次（顺序任意）。
/// 2. 否则返回 `HeaderMismatch`，调用方不得写入任何数据。
fn column_order(header: &StringRecord) -> Result<Vec<usize>, StoreError> {
    let mismatch = || StoreError::HeaderMismatch(header.iter().collect::<Vec<_>>().join(","));
    if header.len() != OUTPUT_COLUMNS.len() {
        return Err(mismatch());
    }

    let order = header
        .iter()
        .map(|name| OUTPUT_COLUMNS.iter().position(|c| *c == name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(mismatch)?;
    if (0..OUTPUT_COLUMNS.len()).all(|i| order.contains(&i)) {
        Ok(order)
    } else {
        Err(mismatch())
    }
}

/// # Summary
/// 以单个 CSV 文件保存的历史 K 线数据集。
///
/// # Invariants
/// - 文件首行为列名，数据行按时间升序。
/// - 追加写入沿用既有文件的列顺序；列集合不同则拒绝写入。
pub struct CsvDatasetStore {
    path: PathBuf,
}

impl CsvDatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>, StoreError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    /// 文件不存在或长度为 0 时返回 None，否则返回其列名
    fn existing_header(&self) -> Result<Option<StringRecord>, StoreError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.len() == 0 => Ok(None),
            Ok(_) => {
                let header = self
                    .reader()?
                    .headers()
                    .map_err(|e| StoreError::Csv(e.to_string()))?
                    .clone();
                Ok(Some(header))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

impl DatasetStore for CsvDatasetStore {
    /// # Summary
    /// 读取数据集最后一行的时间与交易对。
    ///
    /// # Logic
    /// 1. 列名去除首尾空白后校验 `Unix Timestamp` 与 `Symbol` 列存在。
    /// 2. 顺序扫描全部数据行，交易对取第一行，时间取最后一行。
    /// 3. 将时间戳转换为 UTC 时间。
    fn load_tail(&self) -> Result<DatasetTail, StoreError> {
        let mut reader = self.reader()?;

        let headers = reader
            .headers()
            .map_err(|e| StoreError::Csv(e.to_string()))?;
        for column in [TIMESTAMP_COLUMN, SYMBOL_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(StoreError::MissingColumn(column));
            }
        }

        let mut symbol = None;
        let mut last_ts = None;
        for record in reader.deserialize::<TailRecord>() {
            let record = record.map_err(|e| StoreError::Csv(e.to_string()))?;
            symbol.get_or_insert(record.symbol);
            last_ts = Some(record.unix_timestamp);
        }

        let (Some(symbol), Some(last_ts)) = (symbol, last_ts) else {
            return Err(StoreError::Empty);
        };
        let last_time =
            DateTime::from_timestamp(last_ts, 0).ok_or(StoreError::InvalidTimestamp(last_ts))?;

        debug!(path = %self.path.display(), %last_time, %symbol, "Loaded dataset tail");
        Ok(DatasetTail {
            last_time,
            symbol: Symbol(symbol),
        })
    }

    /// # Summary
    /// 将新数据追加到文件末尾。
    ///
    /// # Logic
    /// 1. 新文件或空文件先写列名，列顺序为 `OUTPUT_COLUMNS`。
    /// 2. 既有文件按其列名顺序重排每行；列集合不一致时在写入前返回错误。
    /// 3. 以追加模式逐行写入。
    fn append(&self, series: &NormalizedSeries) -> Result<usize, StoreError> {
        if series.is_empty() {
            return Ok(0);
        }

        let header = self.existing_header()?;
        let order = match &header {
            Some(header) => column_order(header)?,
            None => (0..OUTPUT_COLUMNS.len()).collect(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if header.is_none() {
            writer
                .write_record(OUTPUT_COLUMNS)
                .map_err(|e| StoreError::Csv(e.to_string()))?;
        }
        for row in series.rows() {
            let fields = row_fields(row);
            writer
                .write_record(order.iter().map(|&i| fields[i].as_str()))
                .map_err(|e| StoreError::Csv(e.to_string()))?;
        }
        writer.flush().map_err(|e| StoreError::Io(e.to_string()))?;

        info!(path = %self.path.display(), rows = series.len(), "Appended rows to dataset");
        Ok(series.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_order_follows_existing_header() {
        let header = StringRecord::from(vec![
            "Unix Timestamp",
            "Date",
            "Symbol",
            "Open",
            "High",
            "Low",
            "Close",
            "Volume",
        ]);
        assert_eq!(column_order(&header).unwrap(), vec![0, 6, 7, 3, 2, 1, 4, 5]);
    }

    #[test]
    fn test_column_order_rejects_other_column_sets() {
        let short = StringRecord::from(vec!["Unix Timestamp", "Symbol"]);
        assert!(matches!(column_order(&short), Err(StoreError::HeaderMismatch(_))));

        let mut renamed = OUTPUT_COLUMNS.to_vec();
        renamed[5] = "Base Volume";
        let renamed = StringRecord::from(renamed);
        assert!(matches!(column_order(&renamed), Err(StoreError::HeaderMismatch(_))));

        let mut duplicated = OUTPUT_COLUMNS.to_vec();
        duplicated[1] = "High";
        let duplicated = StringRecord::from(duplicated);
        assert!(matches!(column_order(&duplicated), Err(StoreError::HeaderMismatch(_))));
    }
}
