use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 資產識別碼：PPR 基金或比特幣
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssetId {
    /// PPR 基金（以基金 UUID 識別）
    Fund(Uuid),
    /// 比特幣（歐元計價）
    Bitcoin,
}

impl AssetId {
    /// 是否為基金
    pub fn is_fund(&self) -> bool {
        matches!(self, AssetId::Fund(_))
    }

    /// 取得基金 UUID（比特幣返回 None）
    pub fn fund_id(&self) -> Option<Uuid> {
        match self {
            AssetId::Fund(id) => Some(*id),
            AssetId::Bitcoin => None,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Fund(id) => write!(f, "ppr_{}", id),
            AssetId::Bitcoin => write!(f, "bitcoin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_display() {
        let id = Uuid::nil();
        assert_eq!(AssetId::Fund(id).to_string(), format!("ppr_{}", id));
        assert_eq!(AssetId::Bitcoin.to_string(), "bitcoin");
    }

    #[test]
    fn test_asset_id_accessors() {
        let id = Uuid::new_v4();
        assert!(AssetId::Fund(id).is_fund());
        assert_eq!(AssetId::Fund(id).fund_id(), Some(id));
        assert!(!AssetId::Bitcoin.is_fund());
        assert_eq!(AssetId::Bitcoin.fund_id(), None);
    }
}
