use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain_types::{AssetId, AssetSeries, FundMetadata};

/// 基金目錄特性 - 回測前解析配置中引用的每一個基金
#[async_trait]
pub trait FundCatalog: Send + Sync {
    /// 按 ID 查找基金，不存在時返回 `None`
    async fn get_fund(&self, fund_id: Uuid) -> Result<Option<FundMetadata>>;
}

/// 歷史價格特性 - 定義數據提供模組的核心接口
///
/// 返回的序列按日期升序、不含重複日期，並已截取到 `[start, end]`（含兩端）。
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// 加載基金淨值序列
    async fn load_fund_series(
        &self,
        fund_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AssetSeries>;

    /// 加載比特幣歐元價格序列
    async fn load_bitcoin_series(&self, start: NaiveDate, end: NaiveDate) -> Result<AssetSeries>;
}

#[async_trait]
impl<T: PriceHistoryProvider + ?Sized> PriceHistoryProvider for Arc<T> {
    async fn load_fund_series(
        &self,
        fund_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AssetSeries> {
        (**self).load_fund_series(fund_id, start, end).await
    }

    async fn load_bitcoin_series(&self, start: NaiveDate, end: NaiveDate) -> Result<AssetSeries> {
        (**self).load_bitcoin_series(start, end).await
    }
}

/// 內存數據存儲，同時實現基金目錄與歷史價格兩個接口
#[derive(Debug, Clone)]
pub struct InMemoryDataStore {
    funds: HashMap<Uuid, FundMetadata>,
    fund_series: HashMap<Uuid, AssetSeries>,
    bitcoin: AssetSeries,
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self {
            funds: HashMap::new(),
            fund_series: HashMap::new(),
            bitcoin: AssetSeries::empty(AssetId::Bitcoin),
        }
    }
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入基金及其淨值序列
    pub fn with_fund(mut self, metadata: FundMetadata, series: AssetSeries) -> Self {
        self.insert_fund(metadata, series);
        self
    }

    /// 設定比特幣價格序列
    pub fn with_bitcoin(mut self, series: AssetSeries) -> Self {
        self.bitcoin = series;
        self
    }

    pub fn insert_fund(&mut self, metadata: FundMetadata, series: AssetSeries) {
        self.fund_series.insert(metadata.id, series);
        self.funds.insert(metadata.id, metadata);
    }

    /// 只登記基金目錄資料（尚無淨值）
    pub fn insert_metadata(&mut self, metadata: FundMetadata) {
        self.funds.insert(metadata.id, metadata);
    }

    pub fn set_bitcoin(&mut self, series: AssetSeries) {
        self.bitcoin = series;
    }

    pub fn fund_count(&self) -> usize {
        self.funds.len()
    }

    /// 所有基金資料，按名稱排序
    pub fn funds(&self) -> Vec<&FundMetadata> {
        let mut funds: Vec<&FundMetadata> = self.funds.values().collect();
        funds.sort_by(|a, b| a.name.cmp(&b.name));
        funds
    }

    pub fn bitcoin_len(&self) -> usize {
        self.bitcoin.len()
    }
}

#[async_trait]
impl FundCatalog for InMemoryDataStore {
    async fn get_fund(&self, fund_id: Uuid) -> Result<Option<FundMetadata>> {
        Ok(self.funds.get(&fund_id).cloned())
    }
}

#[async_trait]
impl PriceHistoryProvider for InMemoryDataStore {
    async fn load_fund_series(
        &self,
        fund_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AssetSeries> {
        Ok(self
            .fund_series
            .get(&fund_id)
            .map(|series| series.window(start, end))
            .unwrap_or_else(|| AssetSeries::empty(AssetId::Fund(fund_id))))
    }

    async fn load_bitcoin_series(&self, start: NaiveDate, end: NaiveDate) -> Result<AssetSeries> {
        Ok(self.bitcoin.window(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_types::PricePoint;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn store() -> (InMemoryDataStore, Uuid) {
        let id = Uuid::new_v4();
        let points = (1..=10).map(|day| PricePoint::new(d(day), 5.0 + day as f64)).collect();
        let store = InMemoryDataStore::new()
            .with_fund(
                FundMetadata::new(id, "PPR Teste", "Gestora"),
                AssetSeries::new(AssetId::Fund(id), points).unwrap(),
            )
            .with_bitcoin(
                AssetSeries::new(AssetId::Bitcoin, vec![PricePoint::new(d(5), 60_000.0)]).unwrap(),
            );
        (store, id)
    }

    #[tokio::test]
    async fn test_catalog_lookup() {
        let (store, id) = store();
        assert_eq!(store.get_fund(id).await.unwrap().unwrap().name, "PPR Teste");
        assert!(store.get_fund(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(store.fund_count(), 1);
    }

    #[tokio::test]
    async fn test_series_are_windowed() {
        let (store, id) = store();
        let series = store.load_fund_series(id, d(3), d(6)).await.unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.asset(), AssetId::Fund(id));

        let bitcoin = store.load_bitcoin_series(d(6), d(9)).await.unwrap();
        assert!(bitcoin.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fund_has_empty_series() {
        let (store, _) = store();
        let other = Uuid::new_v4();
        let series = store.load_fund_series(other, d(1), d(10)).await.unwrap();
        assert!(series.is_empty());
        assert_eq!(series.asset(), AssetId::Fund(other));
    }
}
