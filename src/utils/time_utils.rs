// time_utils.rs
//
// 提供日期計算相關的工具函數。回測以日為單位，所有日期均為不含時區的 NaiveDate。

use chrono::{Datelike, NaiveDate, Utc};

/// 獲取當前 UTC 日期
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 計算兩個日期之間相差的日曆天數（`to - from`）
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// 取得日期所屬的日曆月份鍵 (年, 月)
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_between() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        assert_eq!(days_between(start, end), 30);
        assert_eq!(days_between(end, start), -30);
        assert_eq!(days_between(start, start), 0);
    }

    #[test]
    fn test_days_between_leap_year() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(days_between(start, end), 2);
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(month_key(date), (2023, 12));
        assert!(month_key(date) < month_key(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }
}
