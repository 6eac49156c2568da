// utils.rs - 公共工具模組
//
// 提供各種通用的工具函數和輔助方法，用於簡化系統其他部分的代碼。

pub mod decimal_utils;
pub mod serde_helpers;
pub mod time_utils;

// 重新導出常用工具函數，使其可以通過 utils::function_name 直接訪問
pub use decimal_utils::{decimal_to_f64, round_2dp};
pub use serde_helpers::empty_string_as_none;
pub use time_utils::{days_between, month_key, today};
