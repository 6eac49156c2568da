use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// PPR 基金目錄資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMetadata {
    pub id: Uuid,
    pub name: String,
    /// 基金管理公司
    pub manager: String,
    pub isin: Option<String>,
    /// 風險類別，例如 "Conservador"、"Moderado"、"Dinâmico"
    pub category: Option<String>,
    /// 年管理費（百分比）
    pub management_fee: Option<Decimal>,
}

impl FundMetadata {
    /// 以最少欄位創建基金資料
    pub fn new(id: Uuid, name: impl Into<String>, manager: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            manager: manager.into(),
            isin: None,
            category: None,
            management_fee: None,
        }
    }
}
