// decimal_utils.rs - 浮點數與 Decimal 之間的轉換
//
// 內部計算全部使用 f64，只有在輸出時才轉成兩位小數的 Decimal。

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// 將 f64 四捨五入（銀行家捨入）到兩位小數的 Decimal
///
/// NaN 與無窮大無法表示為 Decimal，統一輸出 0；捨入後為零的負數輸出正零。
pub fn round_2dp(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| {
            let mut rounded = d.round_dp(2);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            rounded
        })
        .unwrap_or_default()
}

/// 將 Decimal 轉換為 f64
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
