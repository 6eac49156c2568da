//! 持倉追蹤
//!
//! 持倉是不可變的快照：初始化與每次再平衡都產生新的 `Holdings`，
//! 其餘日期只讀取單位數計算市值。

use chrono::NaiveDate;
use tracing::debug;

use crate::backtest::aligner::{AlignedRow, AlignedSeries};
use crate::backtest::error::{BacktestError, EngineResult};
use crate::domain_types::{AllocationSpec, AssetId};

/// 各資產持有的單位數（可為小數）
#[derive(Debug, Clone, PartialEq)]
pub struct Holdings {
    /// 與對齊序列的欄位順序一致
    positions: Vec<(AssetId, f64)>,
}

impl Holdings {
    /// 資產持有單位數，未持有為 0
    pub fn units(&self, asset: AssetId) -> f64 {
        self.positions
            .iter()
            .find(|(a, _)| *a == asset)
            .map(|(_, units)| *units)
            .unwrap_or(0.0)
    }

    pub fn positions(&self) -> &[(AssetId, f64)] {
        &self.positions
    }

    /// 各資產在該行價格下的市值
    pub fn component_values(&self, row: &AlignedRow) -> Vec<f64> {
        self.positions
            .iter()
            .zip(&row.prices)
            .map(|((_, units), price)| units * price)
            .collect()
    }

    /// 該行價格下的總市值
    pub fn total_value(&self, row: &AlignedRow) -> f64 {
        self.component_values(row).iter().sum()
    }
}

/// 將目標百分比配置轉換為單位數
#[derive(Debug, Clone)]
pub struct PositionTracker {
    assets: Vec<AssetId>,
    /// 各欄位的目標權重（0 到 1）
    weights: Vec<f64>,
}

impl PositionTracker {
    pub fn new(series: &AlignedSeries, allocation: &AllocationSpec) -> Self {
        let assets = series.assets().to_vec();
        let weights = assets.iter().map(|a| allocation.target_weight(*a)).collect();
        Self { assets, weights }
    }

    /// 以首個對齊日期的價格建立初始持倉
    ///
    /// 每個資產的單位數 = 初始投資 × 目標比例 / 首日價格；比例為 0 的資產單位數為 0。
    pub fn initialize(&self, series: &AlignedSeries, initial_investment: f64) -> EngineResult<Holdings> {
        let first = series.rows().first().ok_or_else(|| {
            BacktestError::InsufficientData("對齊序列為空，無法建立初始持倉".to_string())
        })?;

        Ok(self.allocate(first, initial_investment))
    }

    /// 在指定日期按目標比例重新分配持倉
    ///
    /// 總市值在再平衡前後保持不變，只在資產之間重新分配。
    pub fn rebalance(
        &self,
        series: &AlignedSeries,
        date: NaiveDate,
        holdings: &Holdings,
    ) -> EngineResult<Holdings> {
        let row = series.row_at(date).ok_or_else(|| {
            BacktestError::InsufficientData(format!("{} 沒有對齊後的價格，無法再平衡", date))
        })?;

        Ok(self.rebalance_row(row, holdings))
    }

    /// 以已知的行再平衡（估值循環內使用）
    pub(crate) fn rebalance_row(&self, row: &AlignedRow, holdings: &Holdings) -> Holdings {
        let total_value = holdings.total_value(row);
        debug!("{} 再平衡，總市值 {:.2}", row.date, total_value);
        self.allocate(row, total_value)
    }

    fn allocate(&self, row: &AlignedRow, amount: f64) -> Holdings {
        let positions = self
            .assets
            .iter()
            .zip(&self.weights)
            .zip(&row.prices)
            .map(|((asset, weight), price)| (*asset, amount * weight / price))
            .collect();

        Holdings { positions }
    }
}
