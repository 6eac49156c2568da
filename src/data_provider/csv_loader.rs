//! CSV 數據加載
//!
//! 從三個 CSV 檔案建立內存數據存儲：
//! - `funds.csv`: id,name,manager,isin,category,management_fee
//! - `fund_prices.csv`: fund_id,date,quota_value
//! - `bitcoin_prices.csv`: date,price_eur

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{DataConfig, ValidationError};
use crate::data_provider::loader::InMemoryDataStore;
use crate::domain_types::{AssetId, AssetSeries, FundMetadata, PricePoint};
use crate::utils::empty_string_as_none;

/// CSV 加載錯誤類型
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("檔案讀取錯誤 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 解析錯誤: {0}")]
    Parse(#[from] csv::Error),

    #[error("無效的欄位格式: 欄位 {column}, 值 {value}, 原因: {reason}")]
    InvalidFormat {
        column: String,
        value: String,
        reason: String,
    },

    #[error("價格序列無效: {0}")]
    Validation(#[from] ValidationError),
}

/// CSV 加載結果類型
pub type CsvResult<T> = Result<T, CsvError>;

#[derive(Debug, Deserialize)]
struct FundRecord {
    id: Uuid,
    name: String,
    manager: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    isin: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(default)]
    management_fee: Option<Decimal>,
}

impl From<FundRecord> for FundMetadata {
    fn from(record: FundRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            manager: record.manager,
            isin: record.isin,
            category: record.category,
            management_fee: record.management_fee,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FundPriceRecord {
    fund_id: Uuid,
    date: NaiveDate,
    quota_value: f64,
}

#[derive(Debug, Deserialize)]
struct BitcoinPriceRecord {
    date: NaiveDate,
    price_eur: f64,
}

/// CSV 數據加載器
#[derive(Debug, Clone)]
pub struct CsvDataLoader {
    funds_file: PathBuf,
    fund_prices_file: PathBuf,
    bitcoin_prices_file: PathBuf,
}

impl CsvDataLoader {
    pub fn new(
        funds_file: impl Into<PathBuf>,
        fund_prices_file: impl Into<PathBuf>,
        bitcoin_prices_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            funds_file: funds_file.into(),
            fund_prices_file: fund_prices_file.into(),
            bitcoin_prices_file: bitcoin_prices_file.into(),
        }
    }

    /// 依據數據來源配置創建
    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(
            &config.funds_file,
            &config.fund_prices_file,
            &config.bitcoin_prices_file,
        )
    }

    /// 讀取全部檔案並建立內存數據存儲
    pub fn load(&self) -> CsvResult<InMemoryDataStore> {
        let funds = read_funds(open(&self.funds_file)?)?;
        let mut fund_series = read_fund_prices(open(&self.fund_prices_file)?)?;
        let bitcoin = read_bitcoin_prices(open(&self.bitcoin_prices_file)?)?;

        let mut store = InMemoryDataStore::new();
        for metadata in funds {
            match fund_series.remove(&metadata.id) {
                Some(series) => store.insert_fund(metadata, series),
                None => {
                    warn!("基金 {} ({}) 沒有任何淨值記錄", metadata.name, metadata.id);
                    store.insert_metadata(metadata);
                }
            }
        }
        for orphan in fund_series.keys() {
            warn!("淨值檔案中的基金 {} 不在基金目錄中，已忽略", orphan);
        }
        store.set_bitcoin(bitcoin);

        info!(
            "CSV 數據加載完成: {} 個基金, {} 筆比特幣價格",
            store.fund_count(),
            store.bitcoin_len()
        );
        Ok(store)
    }
}

fn open(path: &Path) -> CsvResult<File> {
    File::open(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 讀取基金目錄
pub fn read_funds<R: Read>(reader: R) -> CsvResult<Vec<FundMetadata>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut funds = Vec::new();
    for record in csv_reader.deserialize::<FundRecord>() {
        funds.push(record?.into());
    }
    Ok(funds)
}

/// 讀取基金淨值，按基金分組並按日期排序
pub fn read_fund_prices<R: Read>(reader: R) -> CsvResult<HashMap<Uuid, AssetSeries>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut grouped: HashMap<Uuid, BTreeMap<NaiveDate, f64>> = HashMap::new();

    for record in csv_reader.deserialize::<FundPriceRecord>() {
        let record = record?;
        let prices = grouped.entry(record.fund_id).or_default();
        if prices.insert(record.date, record.quota_value).is_some() {
            return Err(duplicate_date("date", record.date, &AssetId::Fund(record.fund_id)));
        }
    }

    grouped
        .into_iter()
        .map(|(fund_id, prices)| Ok((fund_id, to_series(AssetId::Fund(fund_id), prices)?)))
        .collect()
}

/// 讀取比特幣歐元價格
pub fn read_bitcoin_prices<R: Read>(reader: R) -> CsvResult<AssetSeries> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut prices = BTreeMap::new();

    for record in csv_reader.deserialize::<BitcoinPriceRecord>() {
        let record = record?;
        if prices.insert(record.date, record.price_eur).is_some() {
            return Err(duplicate_date("date", record.date, &AssetId::Bitcoin));
        }
    }

    to_series(AssetId::Bitcoin, prices)
}

fn duplicate_date(column: &str, date: NaiveDate, asset: &AssetId) -> CsvError {
    CsvError::InvalidFormat {
        column: column.to_string(),
        value: date.to_string(),
        reason: format!("{} 的日期重複", asset),
    }
}

fn to_series(asset: AssetId, prices: BTreeMap<NaiveDate, f64>) -> CsvResult<AssetSeries> {
    let points = prices
        .into_iter()
        .map(|(date, price)| PricePoint::new(date, price))
        .collect();
    Ok(AssetSeries::new(asset, points)?)
}
