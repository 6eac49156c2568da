//! 估值循環
//!
//! 按對齊後的日期由左至右折疊：首日建立持倉，其後每天先判斷是否再平衡，
//! 再以當天價格計算各資產市值與總值。不使用任何未來數據。

use chrono::NaiveDate;
use tracing::debug;

use crate::backtest::aligner::AlignedSeries;
use crate::backtest::error::EngineResult;
use crate::backtest::position::PositionTracker;
use crate::backtest::rebalance::should_rebalance;
use crate::domain_types::{AllocationSpec, AssetId, Dated, RebalancingFrequency};

/// 單日估值
#[derive(Debug, Clone, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    /// 各資產市值，順序與對齊序列欄位一致
    pub components: Vec<(AssetId, f64)>,
    pub total: f64,
}

impl DailyValue {
    /// 基金部位市值合計
    pub fn fund_value(&self) -> f64 {
        self.components
            .iter()
            .filter(|(asset, _)| asset.is_fund())
            .map(|(_, value)| value)
            .sum()
    }

    /// 比特幣部位市值，未持有為 0
    pub fn bitcoin_value(&self) -> f64 {
        self.components
            .iter()
            .filter(|(asset, _)| *asset == AssetId::Bitcoin)
            .map(|(_, value)| value)
            .sum()
    }
}

impl Dated for DailyValue {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// 投資組合價值曲線
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCurve {
    points: Vec<DailyValue>,
    rebalance_dates: Vec<NaiveDate>,
}

impl ValueCurve {
    pub fn points(&self) -> &[DailyValue] {
        &self.points
    }

    /// 每日總值序列
    pub fn totals(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total).collect()
    }

    /// 實際發生再平衡的日期（不含首日建倉）
    pub fn rebalance_dates(&self) -> &[NaiveDate] {
        &self.rebalance_dates
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&DailyValue> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DailyValue> {
        self.points.last()
    }
}

/// 在對齊序列上執行估值循環
pub fn run_valuation(
    series: &AlignedSeries,
    allocation: &AllocationSpec,
    initial_investment: f64,
    frequency: RebalancingFrequency,
) -> EngineResult<ValueCurve> {
    let tracker = PositionTracker::new(series, allocation);
    let mut holdings = tracker.initialize(series, initial_investment)?;

    let rows = series.rows();
    let mut points = Vec::with_capacity(rows.len());
    let mut rebalance_dates = Vec::new();
    let mut last_rebalance: Option<NaiveDate> = None;

    for row in rows {
        match last_rebalance {
            // 首日即建倉日
            None => last_rebalance = Some(row.date),
            Some(last) if should_rebalance(last, row.date, frequency) => {
                holdings = tracker.rebalance_row(row, &holdings);
                last_rebalance = Some(row.date);
                rebalance_dates.push(row.date);
            }
            Some(_) => {}
        }

        let values = holdings.component_values(row);
        let total = values.iter().sum();
        let components = series.assets().iter().copied().zip(values).collect();

        points.push(DailyValue {
            date: row.date,
            components,
            total,
        });
    }

    debug!(
        "估值完成: {} 個交易日, 再平衡 {} 次 ({})",
        points.len(),
        rebalance_dates.len(),
        frequency
    );

    Ok(ValueCurve {
        points,
        rebalance_dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::aligner::AlignedRow;
    use crate::domain_types::FundAllocation;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    /// 基金價格固定，比特幣每天上漲 1%
    fn hybrid(days: i64) -> (AlignedSeries, AllocationSpec) {
        let allocation = AllocationSpec::new(
            vec![FundAllocation::new(Uuid::new_v4(), dec!(70))],
            dec!(30),
        )
        .unwrap();
        let rows = (0..days)
            .map(|i| AlignedRow {
                date: start() + Duration::days(i),
                prices: vec![10.0, 20_000.0 * 1.01f64.powi(i as i32)],
            })
            .collect();
        (AlignedSeries::new(allocation.assets(), rows).unwrap(), allocation)
    }

    #[test]
    fn test_first_day_equals_initial_investment() {
        let (series, allocation) = hybrid(10);
        let curve = run_valuation(&series, &allocation, 10_000.0, RebalancingFrequency::None).unwrap();

        assert_eq!(curve.len(), 10);
        let first = curve.first().unwrap();
        assert!((first.total - 10_000.0).abs() < 1e-6);
        assert!((first.fund_value() - 7_000.0).abs() < 1e-6);
        assert!((first.bitcoin_value() - 3_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_rebalancing_lets_weights_drift() {
        let (series, allocation) = hybrid(100);
        let curve = run_valuation(&series, &allocation, 10_000.0, RebalancingFrequency::None).unwrap();

        assert!(curve.rebalance_dates().is_empty());
        let last = curve.last().unwrap();
        assert!((last.fund_value() - 7_000.0).abs() < 1e-6);
        assert!(last.bitcoin_value() / last.total > 0.3);
    }

    #[test]
    fn test_monthly_rebalance_dates() {
        let (series, allocation) = hybrid(100);
        let curve =
            run_valuation(&series, &allocation, 10_000.0, RebalancingFrequency::Monthly).unwrap();

        assert_eq!(
            curve.rebalance_dates(),
            &[
                start() + Duration::days(30),
                start() + Duration::days(60),
                start() + Duration::days(90)
            ]
        );

        // 再平衡當天權重回到目標
        let day_30 = &curve.points()[30];
        assert!((day_30.bitcoin_value() / day_30.total - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_rebalancing_does_not_change_same_day_total() {
        let (series, allocation) = hybrid(40);
        let with = run_valuation(&series, &allocation, 10_000.0, RebalancingFrequency::Monthly).unwrap();
        let without = run_valuation(&series, &allocation, 10_000.0, RebalancingFrequency::None).unwrap();

        // 第一次再平衡當天之前（含當天）兩條曲線相同
        for i in 0..=30 {
            assert!((with.points()[i].total - without.points()[i].total).abs() < 1e-6);
        }
        assert_ne!(with.totals()[39], without.totals()[39]);
    }
}
