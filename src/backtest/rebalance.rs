//! 再平衡決策
//!
//! 純函數：只依據上次再平衡日期、當前日期與頻率判斷今天是否再平衡。

use chrono::NaiveDate;

use crate::domain_types::RebalancingFrequency;
use crate::utils::days_between;

/// 判斷當前日期是否應該再平衡
///
/// `none` 永遠不再平衡；其餘頻率在經過的日曆天數達到門檻（含）時觸發。
pub fn should_rebalance(
    last_rebalance: NaiveDate,
    current: NaiveDate,
    frequency: RebalancingFrequency,
) -> bool {
    match frequency.threshold_days() {
        Some(threshold) => days_between(last_rebalance, current) >= threshold,
        None => false,
    }
}
