// utils/serde_helpers.rs - 序列化與反序列化輔助函數
use serde::{Deserialize, Deserializer};

/// 將空字符串反序列化為None
///
/// CSV 檔案中的選填欄位（如 ISIN、類別）經常留空，
/// 這個函數可用於 serde 的自定義反序列化器。
///
/// # 使用範例
///
/// ```
/// use serde::Deserialize;
/// use ppr_backtest::utils::serde_helpers::empty_string_as_none;
///
/// #[derive(Deserialize)]
/// struct FundRow {
///     #[serde(deserialize_with = "empty_string_as_none")]
///     isin: Option<String>,
/// }
///
/// let row: FundRow = serde_json::from_str(r#"{"isin": ""}"#).unwrap();
/// assert!(row.isin.is_none());
/// ```
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}
