use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::{ValidationError, ValidationUtils};
use crate::domain_types::AssetId;
use crate::utils::decimal_to_f64;

/// 總配置比例允許的誤差（百分點）
pub const ALLOCATION_TOLERANCE: Decimal = dec!(0.01);

/// 單一基金的目標配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAllocation {
    pub fund_id: Uuid,
    /// 目標配置百分比 (0-100)
    pub allocation_percentage: Decimal,
}

impl FundAllocation {
    pub fn new(fund_id: Uuid, allocation_percentage: Decimal) -> Self {
        Self {
            fund_id,
            allocation_percentage,
        }
    }
}

/// 投資組合目標配置：一個或多個基金加上可選的比特幣部位
///
/// 構造時完成驗證，之後不可變。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSpec {
    fund_allocations: Vec<FundAllocation>,
    bitcoin_percentage: Decimal,
}

impl AllocationSpec {
    /// 創建並驗證配置
    ///
    /// 規則：至少一個基金；每個比例在 [0,100]；基金不可重複；
    /// 基金合計在 [0,100]；基金加比特幣合計等於 100%（誤差 0.01）。
    pub fn new(
        fund_allocations: Vec<FundAllocation>,
        bitcoin_percentage: Decimal,
    ) -> Result<Self, ValidationError> {
        if fund_allocations.is_empty() {
            return Err(ValidationError::MissingField("fund_allocations".to_string()));
        }

        let mut seen = HashSet::new();
        for allocation in &fund_allocations {
            ValidationUtils::in_range(
                allocation.allocation_percentage,
                Decimal::ZERO,
                Decimal::ONE_HUNDRED,
                &format!("fund_allocations[{}].allocation_percentage", allocation.fund_id),
            )?;
            if !seen.insert(allocation.fund_id) {
                return Err(ValidationError::InvalidValue(format!(
                    "基金 {} 重複出現在配置中",
                    allocation.fund_id
                )));
            }
        }

        ValidationUtils::in_range(
            bitcoin_percentage,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
            "bitcoin_percentage",
        )?;

        let funds_total: Decimal = fund_allocations
            .iter()
            .map(|a| a.allocation_percentage)
            .sum();
        ValidationUtils::in_range(funds_total, Decimal::ZERO, Decimal::ONE_HUNDRED, "fund_allocations")?;

        let total = funds_total + bitcoin_percentage;
        if (total - Decimal::ONE_HUNDRED).abs() > ALLOCATION_TOLERANCE {
            return Err(ValidationError::AllocationTotal {
                total: total.to_string(),
                funds: funds_total.to_string(),
                bitcoin: bitcoin_percentage.to_string(),
            });
        }

        Ok(Self {
            fund_allocations,
            bitcoin_percentage,
        })
    }

    pub fn fund_allocations(&self) -> &[FundAllocation] {
        &self.fund_allocations
    }

    pub fn bitcoin_percentage(&self) -> Decimal {
        self.bitcoin_percentage
    }

    /// 比特幣是否參與投資組合（比例大於 0）
    pub fn has_bitcoin(&self) -> bool {
        self.bitcoin_percentage > Decimal::ZERO
    }

    /// 所有基金配置比例合計
    pub fn funds_total(&self) -> Decimal {
        self.fund_allocations
            .iter()
            .map(|a| a.allocation_percentage)
            .sum()
    }

    pub fn fund_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.fund_allocations.iter().map(|a| a.fund_id)
    }

    /// 參與回測的資產欄位，基金按配置順序，比特幣（若比例大於 0）在最後
    pub fn assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self.fund_ids().map(AssetId::Fund).collect();
        if self.has_bitcoin() {
            assets.push(AssetId::Bitcoin);
        }
        assets
    }

    /// 資產的目標百分比，未出現的資產為 0
    pub fn target_percentage(&self, asset: AssetId) -> Decimal {
        match asset {
            AssetId::Bitcoin => self.bitcoin_percentage,
            AssetId::Fund(id) => self
                .fund_allocations
                .iter()
                .find(|a| a.fund_id == id)
                .map(|a| a.allocation_percentage)
                .unwrap_or(Decimal::ZERO),
        }
    }

    /// 資產的目標權重（0 到 1 之間的小數）
    pub fn target_weight(&self, asset: AssetId) -> f64 {
        decimal_to_f64(self.target_percentage(asset)) / 100.0
    }
}
