//! 數據提供模組
//!
//! 定義回測核心消費的兩個外部協作者接口（基金目錄與歷史價格），
//! 並提供內存、CSV 與帶快取的實現。

pub mod cache;
pub mod csv_loader;
pub mod loader;

pub use cache::{CacheStats, CachedPriceProvider, SeriesKey};
pub use csv_loader::{CsvDataLoader, CsvError, CsvResult};
pub use loader::{FundCatalog, InMemoryDataStore, PriceHistoryProvider};
