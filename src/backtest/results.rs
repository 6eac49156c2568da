//! 回測輸出類型
//!
//! 內部 f64 數值在這裡統一轉換為兩位小數的 `Decimal`。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backtest::metrics::MetricValues;
use crate::backtest::valuation::{DailyValue, ValueCurve};
use crate::domain_types::{AllocationSpec, BacktestRequest, FundMetadata};
use crate::utils::{decimal_to_f64, round_2dp};

/// 展示用的績效指標（百分比與歐元金額皆為兩位小數）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: Decimal,
    pub total_return_pct: Decimal,
    pub annualized_return: Decimal,
    pub cagr: Decimal,
    pub volatility: Decimal,
    pub sharpe_ratio: Decimal,
    pub sortino_ratio: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_duration_days: usize,
    pub final_value: Decimal,
    pub best_month: Decimal,
    pub worst_month: Decimal,
    pub positive_months: usize,
    pub total_months: usize,
}

impl From<&MetricValues> for PerformanceMetrics {
    fn from(m: &MetricValues) -> Self {
        Self {
            total_return: round_2dp(m.total_return),
            total_return_pct: round_2dp(m.total_return_pct),
            annualized_return: round_2dp(m.annualized_return),
            cagr: round_2dp(m.cagr),
            volatility: round_2dp(m.volatility),
            sharpe_ratio: round_2dp(m.sharpe_ratio),
            sortino_ratio: round_2dp(m.sortino_ratio),
            max_drawdown: round_2dp(m.max_drawdown),
            max_drawdown_duration_days: m.max_drawdown_duration_days,
            final_value: round_2dp(m.final_value),
            best_month: round_2dp(m.best_month),
            worst_month: round_2dp(m.worst_month),
            positive_months: m.positive_months,
            total_months: m.total_months,
        }
    }
}

/// 歷史曲線上的單日數據點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub portfolio_value: Decimal,
    /// 所有基金部位市值合計
    pub ppr_value: Decimal,
    pub bitcoin_value: Decimal,
    /// 相對首日價值的累計報酬（%）
    pub total_return: Decimal,
    /// 相對歷史高點的回撤（%）
    pub drawdown: Decimal,
}

/// 單一基金的配置明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationBreakdown {
    pub fund_id: Uuid,
    pub fund_name: String,
    pub allocation_percentage: Decimal,
    pub current_value: Decimal,
    /// 對整體初始投資的報酬貢獻（%）
    pub contribution_to_return: Decimal,
}

/// 單次回測結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub portfolio_config: BacktestRequest,
    pub metrics: PerformanceMetrics,
    pub historical_data: Vec<HistoricalDataPoint>,
    pub allocation_breakdown: Vec<AllocationBreakdown>,
    pub calculation_date: NaiveDate,
}

/// 將價值曲線轉換為歷史數據點
pub fn build_historical_data(curve: &ValueCurve) -> Vec<HistoricalDataPoint> {
    let Some(first) = curve.first() else {
        return Vec::new();
    };
    let initial_value = first.total;
    let mut peak = initial_value;

    curve
        .points()
        .iter()
        .map(|point| {
            peak = peak.max(point.total);
            let drawdown = if peak > 0.0 {
                (point.total - peak) / peak * 100.0
            } else {
                0.0
            };

            HistoricalDataPoint {
                date: point.date,
                portfolio_value: round_2dp(point.total),
                ppr_value: round_2dp(point.fund_value()),
                bitcoin_value: round_2dp(point.bitcoin_value()),
                total_return: round_2dp((point.total - initial_value) / initial_value * 100.0),
                drawdown: round_2dp(drawdown),
            }
        })
        .collect()
}

/// 按基金計算期末市值與報酬貢獻
///
/// 期末基金部位總市值按各基金在「基金配置合計」中的佔比分攤；
/// 貢獻以整體初始投資為分母。`funds` 與配置中的基金順序一致。
pub fn build_allocation_breakdown(
    allocation: &AllocationSpec,
    funds: &[FundMetadata],
    final_point: &DailyValue,
    initial_investment: f64,
) -> Vec<AllocationBreakdown> {
    let fund_value = final_point.fund_value();
    let funds_total = decimal_to_f64(allocation.funds_total());

    allocation
        .fund_allocations()
        .iter()
        .zip(funds)
        .map(|(fund_allocation, metadata)| {
            let pct = decimal_to_f64(fund_allocation.allocation_percentage);
            let current_value = if funds_total > 0.0 {
                fund_value * pct / funds_total
            } else {
                0.0
            };
            let initial_share = initial_investment * pct / 100.0;
            let contribution = (current_value - initial_share) / initial_investment * 100.0;

            AllocationBreakdown {
                fund_id: fund_allocation.fund_id,
                fund_name: metadata.name.clone(),
                allocation_percentage: fund_allocation.allocation_percentage,
                current_value: round_2dp(current_value),
                contribution_to_return: round_2dp(contribution),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_types::{AssetId, FundAllocation};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn test_metrics_rounding_and_non_finite() {
        let values = MetricValues {
            total_return: 1234.5678,
            cagr: f64::NAN,
            sharpe_ratio: f64::INFINITY,
            max_drawdown: -12.499999,
            positive_months: 4,
            ..Default::default()
        };
        let presented = PerformanceMetrics::from(&values);

        assert_eq!(presented.total_return, dec!(1234.57));
        assert_eq!(presented.cagr, Decimal::ZERO);
        assert_eq!(presented.sharpe_ratio, Decimal::ZERO);
        assert_eq!(presented.max_drawdown, dec!(-12.50));
        assert_eq!(presented.positive_months, 4);
    }

    #[test]
    fn test_breakdown_apportions_by_fund_share() {
        let fund_a = Uuid::new_v4();
        let fund_b = Uuid::new_v4();
        let allocation = AllocationSpec::new(
            vec![
                FundAllocation::new(fund_a, dec!(40)),
                FundAllocation::new(fund_b, dec!(30)),
            ],
            dec!(30),
        )
        .unwrap();
        let funds = vec![
            FundMetadata::new(fund_a, "PPR A", "Gestora A"),
            FundMetadata::new(fund_b, "PPR B", "Gestora B"),
        ];
        let final_point = DailyValue {
            date: day(1),
            components: vec![
                (AssetId::Fund(fund_a), 4_500.0),
                (AssetId::Fund(fund_b), 2_500.0),
                (AssetId::Bitcoin, 6_000.0),
            ],
            total: 13_000.0,
        };

        let breakdown = build_allocation_breakdown(&allocation, &funds, &final_point, 10_000.0);

        assert_eq!(breakdown.len(), 2);
        // 7000 × 40 / 70
        assert_eq!(breakdown[0].current_value, dec!(4000.00));
        assert_eq!(breakdown[0].contribution_to_return, dec!(0.00));
        assert_eq!(breakdown[0].fund_name, "PPR A");
        // 7000 × 30 / 70 = 3000，初始 3000
        assert_eq!(breakdown[1].current_value, dec!(3000.00));
        assert_eq!(breakdown[1].allocation_percentage, dec!(30));
    }

    #[test]
    fn test_breakdown_with_zero_fund_total() {
        let fund = Uuid::new_v4();
        let allocation =
            AllocationSpec::new(vec![FundAllocation::new(fund, dec!(0))], dec!(100)).unwrap();
        let final_point = DailyValue {
            date: day(1),
            components: vec![(AssetId::Fund(fund), 0.0), (AssetId::Bitcoin, 12_000.0)],
            total: 12_000.0,
        };

        let breakdown = build_allocation_breakdown(
            &allocation,
            &[FundMetadata::new(fund, "PPR", "Gestora")],
            &final_point,
            10_000.0,
        );
        assert_eq!(breakdown[0].current_value, Decimal::ZERO);
        assert_eq!(breakdown[0].contribution_to_return, Decimal::ZERO);
    }
}
