//! 再平衡頻率定義模組 - 從 config/rebalancing.toml 編譯時生成
//!
//! 門檻以固定日曆天數表示（每月 30 天、每季 90 天、每年 365 天），
//! 長期回測時會與真實月份邊界逐漸偏移，這是刻意的近似。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ValidationError;

// 包含由 build.rs 生成的頻率宏定義
include!(concat!(env!("OUT_DIR"), "/rebalancing_generated.rs"));

/// 生成頻率枚舉的內部宏
macro_rules! generate_rebalancing_enum {
    ($(($variant:ident, $name:literal, $days:literal, $display:literal)),*) => {
        /// 投資組合再平衡頻率
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum RebalancingFrequency {
            $(
                $variant,
            )*
        }

        impl RebalancingFrequency {
            /// 距離上次再平衡需經過的日曆天數，`None` 表示從不再平衡
            pub fn threshold_days(&self) -> Option<i64> {
                match self {
                    $(
                        RebalancingFrequency::$variant => {
                            if $days == 0 { None } else { Some($days as i64) }
                        }
                    )*
                }
            }

            /// 獲取序列化名稱
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(
                        RebalancingFrequency::$variant => $name,
                    )*
                }
            }

            /// 獲取顯示名稱
            pub fn display_name(&self) -> &'static str {
                match self {
                    $(
                        RebalancingFrequency::$variant => $display,
                    )*
                }
            }

            /// 獲取所有頻率列表
            pub fn all() -> Vec<RebalancingFrequency> {
                vec![
                    $(
                        RebalancingFrequency::$variant,
                    )*
                ]
            }
        }

        impl FromStr for RebalancingFrequency {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $(
                        $name => Ok(RebalancingFrequency::$variant),
                    )*
                    other => Err(ValidationError::InvalidValue(format!(
                        "未知的再平衡頻率: {}",
                        other
                    ))),
                }
            }
        }
    };
}

rebalancing_frequencies!(generate_rebalancing_enum);

impl Default for RebalancingFrequency {
    fn default() -> Self {
        RebalancingFrequency::Quarterly
    }
}

impl fmt::Display for RebalancingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_days() {
        assert_eq!(RebalancingFrequency::None.threshold_days(), None);
        assert_eq!(RebalancingFrequency::Monthly.threshold_days(), Some(30));
        assert_eq!(RebalancingFrequency::Quarterly.threshold_days(), Some(90));
        assert_eq!(RebalancingFrequency::Yearly.threshold_days(), Some(365));
    }

    #[test]
    fn test_parse_and_display() {
        for freq in RebalancingFrequency::all() {
            assert_eq!(freq.as_str().parse::<RebalancingFrequency>().unwrap(), freq);
            assert_eq!(freq.to_string(), freq.as_str());
            assert!(!freq.display_name().is_empty());
        }
        assert_eq!(" Monthly ".parse::<RebalancingFrequency>().unwrap(), RebalancingFrequency::Monthly);
        assert!("weekly".parse::<RebalancingFrequency>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&RebalancingFrequency::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");

        let parsed: RebalancingFrequency = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(parsed, RebalancingFrequency::None);
    }

    #[test]
    fn test_default_is_quarterly() {
        assert_eq!(RebalancingFrequency::default(), RebalancingFrequency::Quarterly);
    }
}
