use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::data_provider::loader::PriceHistoryProvider;
use crate::domain_types::{AssetId, AssetSeries};

/// 價格序列快取鍵
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub asset: AssetId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeriesKey {
    pub fn new(asset: AssetId, start: NaiveDate, end: NaiveDate) -> Self {
        Self { asset, start, end }
    }
}

/// 快取統計信息
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// 當前快取項目數
    pub size: usize,
    /// 快取容量
    pub capacity: u64,
}

/// 帶內存快取的價格提供者裝飾器
///
/// 以 (資產, 開始日, 結束日) 為鍵快取完整的窗口序列；加載失敗不寫入快取。
pub struct CachedPriceProvider<P: PriceHistoryProvider> {
    inner: P,
    cache: Cache<SeriesKey, Arc<AssetSeries>>,
    capacity: u64,
}

impl<P: PriceHistoryProvider> CachedPriceProvider<P> {
    /// 創建快取裝飾器
    ///
    /// # Arguments
    /// * `inner` - 實際的價格提供者
    /// * `capacity` - 最多快取的序列數
    /// * `ttl` - 快取過期時間
    pub fn new(inner: P, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            inner,
            cache,
            capacity,
        }
    }

    /// 依據快取配置創建
    pub fn from_config(inner: P, config: &CacheConfig) -> Self {
        Self::new(inner, config.capacity, config.ttl())
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// 清空所有快取
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// 獲取快取統計信息
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            size: self.cache.entry_count() as usize,
            capacity: self.capacity,
        }
    }

    async fn cached(&self, key: SeriesKey) -> Option<AssetSeries> {
        let hit = self.cache.get(&key).await;
        if hit.is_some() {
            debug!("價格快取命中: {} [{}, {}]", key.asset, key.start, key.end);
        }
        hit.map(|series| (*series).clone())
    }

    async fn store(&self, key: SeriesKey, series: &AssetSeries) {
        self.cache.insert(key, Arc::new(series.clone())).await;
    }
}

#[async_trait]
impl<P: PriceHistoryProvider> PriceHistoryProvider for CachedPriceProvider<P> {
    async fn load_fund_series(
        &self,
        fund_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AssetSeries> {
        let key = SeriesKey::new(AssetId::Fund(fund_id), start, end);
        if let Some(series) = self.cached(key).await {
            return Ok(series);
        }

        let series = self.inner.load_fund_series(fund_id, start, end).await?;
        self.store(key, &series).await;
        Ok(series)
    }

    async fn load_bitcoin_series(&self, start: NaiveDate, end: NaiveDate) -> Result<AssetSeries> {
        let key = SeriesKey::new(AssetId::Bitcoin, start, end);
        if let Some(series) = self.cached(key).await {
            return Ok(series);
        }

        let series = self.inner.load_bitcoin_series(start, end).await?;
        self.store(key, &series).await;
        Ok(series)
    }
}
