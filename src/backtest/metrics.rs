//! 績效指標計算
//!
//! 所有指標都由每日總值曲線導出，內部使用 f64 全精度；
//! 四捨五入到兩位小數只在 `results` 模組輸出時進行。
//!
//! 數值退化情況（零波動、單一觀測值、從未回撤）一律輸出 0，不視為錯誤。

use statrs::statistics::Statistics;
use tracing::debug;

use crate::backtest::error::{BacktestError, EngineResult};
use crate::backtest::valuation::ValueCurve;
use crate::config::ValidationError;
use crate::utils::month_key;

/// 年化波動率使用的年交易日數
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// 以觀測值數量換算年數時使用的一年天數
pub const DAYS_PER_YEAR: f64 = 365.25;

/// 視為「水下」的回撤門檻（百分比）
pub const UNDERWATER_THRESHOLD: f64 = -0.01;

/// 浮點捨入雜訊上限（百分比）；年化標準差與回撤低於此值時視為 0
pub const NUMERIC_NOISE: f64 = 1e-9;

/// 一次回測的原始指標值（未四捨五入）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricValues {
    pub total_return: f64,
    pub total_return_pct: f64,
    pub annualized_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration_days: usize,
    pub final_value: f64,
    pub best_month: f64,
    pub worst_month: f64,
    pub positive_months: usize,
    pub total_months: usize,
}

/// 指標計算引擎
///
/// 無風險利率為年化百分比，預設 0。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsEngine {
    risk_free_rate: f64,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_risk_free_rate(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// 由價值曲線計算全部指標
    pub fn compute(&self, curve: &ValueCurve, initial_investment: f64) -> EngineResult<MetricValues> {
        let values = curve.totals();
        let final_value = *values
            .last()
            .ok_or_else(|| BacktestError::InsufficientData("價值曲線為空".to_string()))?;

        if initial_investment <= 0.0 {
            return Err(BacktestError::Validation(ValidationError::InvalidValue(format!(
                "initial_investment 必須大於 0，實際為 {}",
                initial_investment
            ))));
        }

        let total_return = final_value - initial_investment;
        let total_return_pct = total_return / initial_investment * 100.0;

        let returns = daily_returns(&values);

        // 以觀測值數量近似年數，依賴對齊後的日頻密度
        let num_years = values.len() as f64 / DAYS_PER_YEAR;
        let cagr = if num_years > 0.0 {
            ((final_value / initial_investment).powf(1.0 / num_years) - 1.0) * 100.0
        } else {
            0.0
        };
        let annualized_return = cagr;

        let volatility = annualized_deviation(&returns);
        let sharpe_ratio = self.excess_ratio(annualized_return, volatility);

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_deviation = annualized_deviation(&downside);
        let sortino_ratio = self.excess_ratio(annualized_return, downside_deviation);

        let drawdowns = drawdown_series(&returns);
        let max_drawdown = drawdowns.iter().copied().fold(0.0, f64::min);
        let max_drawdown_duration_days = longest_underwater_run(&drawdowns);

        let monthly = monthly_returns(curve);
        let (best_month, worst_month, positive_months) = if monthly.is_empty() {
            (0.0, 0.0, 0)
        } else {
            (
                monthly.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                monthly.iter().copied().fold(f64::INFINITY, f64::min),
                monthly.iter().filter(|r| **r > 0.0).count(),
            )
        };

        debug!(
            "指標計算完成: {} 個觀測值, CAGR {:.4}%, 波動率 {:.4}%, 最大回撤 {:.4}%",
            values.len(),
            cagr,
            volatility,
            max_drawdown
        );

        Ok(MetricValues {
            total_return,
            total_return_pct,
            annualized_return,
            cagr,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration_days,
            final_value,
            best_month,
            worst_month,
            positive_months,
            total_months: monthly.len(),
        })
    }

    /// (年化報酬 - 無風險利率) / 風險，風險不為正時為 0
    fn excess_ratio(&self, annualized_return: f64, risk: f64) -> f64 {
        if risk > 0.0 {
            (annualized_return - self.risk_free_rate) / risk
        } else {
            0.0
        }
    }
}

/// 每日簡單報酬 `V[i]/V[i-1] - 1`
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// 樣本標準差年化後的百分比
///
/// 少於兩個觀測值、非有限值或僅為捨入雜訊時為 0。
fn annualized_deviation(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let annualized = returns.std_dev() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
    if annualized.is_finite() && annualized >= NUMERIC_NOISE {
        annualized
    } else {
        0.0
    }
}

/// 累積報酬曲線相對其歷史高點的回撤百分比（恆不大於 0）
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut cumulative = 1.0;
    let mut peak = f64::NEG_INFINITY;

    returns
        .iter()
        .map(|r| {
            cumulative *= 1.0 + r;
            peak = peak.max(cumulative);
            let drawdown = (cumulative - peak) / peak * 100.0;
            if drawdown > -NUMERIC_NOISE {
                0.0
            } else {
                drawdown
            }
        })
        .collect()
}

/// 回撤低於門檻的最長連續觀測值數
fn longest_underwater_run(drawdowns: &[f64]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for dd in drawdowns {
        if *dd < UNDERWATER_THRESHOLD {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// 以每月最後一個觀測值計算的月報酬百分比
pub fn monthly_returns(curve: &ValueCurve) -> Vec<f64> {
    let mut month_ends: Vec<((i32, u32), f64)> = Vec::new();
    for point in curve.points() {
        let key = month_key(point.date);
        match month_ends.last_mut() {
            Some((last_key, value)) if *last_key == key => *value = point.total,
            _ => month_ends.push((key, point.total)),
        }
    }

    month_ends
        .windows(2)
        .map(|w| (w[1].1 / w[0].1 - 1.0) * 100.0)
        .collect()
}

/// 各指標的說明，供展示層使用
pub fn metric_descriptions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("total_return", "Absolute gain/loss in EUR from initial investment"),
        ("total_return_pct", "Total return expressed as percentage of initial investment"),
        ("annualized_return", "Average yearly return percentage (same as CAGR)"),
        ("cagr", "Compound Annual Growth Rate - geometric average return per year"),
        ("volatility", "Annualized standard deviation of daily returns (252 trading days)"),
        (
            "sharpe_ratio",
            "Risk-adjusted return = (Return - Risk-free rate) / Volatility. Higher is better.",
        ),
        (
            "sortino_ratio",
            "Downside risk-adjusted return - only penalizes downside volatility. Higher is better.",
        ),
        (
            "max_drawdown",
            "Largest peak-to-trough decline in percentage terms. Negative number, closer to 0 is better.",
        ),
        (
            "max_drawdown_duration_days",
            "Longest period (in days) the portfolio was underwater (below previous peak)",
        ),
        ("final_value", "Portfolio value at the end of the period in EUR"),
        ("best_month", "Best monthly return percentage during the period"),
        ("worst_month", "Worst monthly return percentage during the period"),
        ("positive_months", "Number of months with positive returns"),
        ("total_months", "Number of month-over-month return observations"),
        (
            "rebalancing",
            "none = buy and hold, monthly = rebalance every ~30 days, quarterly = every ~90 days, yearly = every ~365 days",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::aligner::{AlignedRow, AlignedSeries};
    use crate::backtest::valuation::run_valuation;
    use crate::domain_types::{AllocationSpec, FundAllocation, RebalancingFrequency};
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    /// 單一基金、價格等於給定曲線的價值曲線（初始投資等於首日價格）
    fn curve_from(start: NaiveDate, prices: &[f64]) -> ValueCurve {
        let allocation =
            AllocationSpec::new(vec![FundAllocation::new(Uuid::new_v4(), dec!(100))], dec!(0)).unwrap();
        let rows = prices
            .iter()
            .enumerate()
            .map(|(i, p)| AlignedRow {
                date: start + Duration::days(i as i64),
                prices: vec![*p],
            })
            .collect();
        let series = AlignedSeries::new(allocation.assets(), rows).unwrap();
        run_valuation(&series, &allocation, prices[0], RebalancingFrequency::None).unwrap()
    }

    fn jan_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_drawdown_scenario() {
        let curve = curve_from(jan_1(), &[100.0, 120.0, 110.0, 105.0, 115.0, 130.0]);
        let metrics = MetricsEngine::new().compute(&curve, 100.0).unwrap();

        assert!((metrics.max_drawdown + 12.5).abs() < 1e-9);
        assert_eq!(metrics.max_drawdown_duration_days, 3);
        assert!((metrics.total_return - 30.0).abs() < 1e-9);
        assert!((metrics.total_return_pct - 30.0).abs() < 1e-9);
        assert!((metrics.final_value - 130.0).abs() < 1e-9);
        assert!(metrics.volatility > 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert_eq!(metrics.annualized_return, metrics.cagr);
    }

    #[test]
    fn test_flat_curve_is_all_zero() {
        let curve = curve_from(jan_1(), &vec![100.0; 365]);
        let metrics = MetricsEngine::new().compute(&curve, 100.0).unwrap();

        assert_eq!(metrics.total_return_pct, 0.0);
        assert!(metrics.cagr.abs() < 1e-12);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.max_drawdown_duration_days, 0);
        assert_eq!(metrics.positive_months, 0);
        assert_eq!(metrics.total_months, 11);
    }

    #[test]
    fn test_flat_prices_with_rebalancing_have_zero_risk() {
        let allocation = AllocationSpec::new(
            vec![
                FundAllocation::new(Uuid::new_v4(), dec!(12.5)),
                FundAllocation::new(Uuid::new_v4(), dec!(57.5)),
            ],
            dec!(30),
        )
        .unwrap();
        let rows = (0..1500)
            .map(|i| AlignedRow {
                date: jan_1() + Duration::days(i),
                prices: vec![7.77, 1.11, 27_123.45],
            })
            .collect();
        let series = AlignedSeries::new(allocation.assets(), rows).unwrap();
        let curve = run_valuation(&series, &allocation, 12_345.67, RebalancingFrequency::Monthly).unwrap();
        assert!(!curve.rebalance_dates().is_empty());

        let metrics = MetricsEngine::new().compute(&curve, 12_345.67).unwrap();
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.max_drawdown_duration_days, 0);
    }

    #[test]
    fn test_non_positive_investment_is_validation_error() {
        let curve = curve_from(jan_1(), &[100.0, 101.0]);
        let err = MetricsEngine::new().compute(&curve, 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::Validation(ValidationError::InvalidValue(_))));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_single_observation() {
        let curve = curve_from(jan_1(), &[250.0]);
        let metrics = MetricsEngine::new().compute(&curve, 250.0).unwrap();

        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.total_months, 0);
        assert_eq!(metrics.best_month, 0.0);
        assert_eq!(metrics.final_value, 250.0);
    }

    #[test]
    fn test_risk_free_rate_lowers_sharpe() {
        let prices: Vec<f64> = (0..200)
            .map(|i| 100.0 * (1.0 + 0.001 * i as f64) + if i % 2 == 0 { 0.5 } else { 0.0 })
            .collect();
        let curve = curve_from(jan_1(), &prices);

        let base = MetricsEngine::new().compute(&curve, prices[0]).unwrap();
        let with_rf = MetricsEngine::with_risk_free_rate(3.0)
            .compute(&curve, prices[0])
            .unwrap();

        assert_eq!(base.volatility, with_rf.volatility);
        let expected = (base.annualized_return - 3.0) / base.volatility;
        assert!((with_rf.sharpe_ratio - expected).abs() < 1e-12);
        assert!(with_rf.sharpe_ratio < base.sharpe_ratio);
    }

    #[test]
    fn test_single_negative_return_gives_zero_sortino() {
        // 只有一個負報酬時下行標準差無法計算
        let curve = curve_from(jan_1(), &[100.0, 110.0, 105.0, 120.0]);
        let metrics = MetricsEngine::new().compute(&curve, 100.0).unwrap();

        assert_eq!(metrics.sortino_ratio, 0.0);
        assert!(metrics.sharpe_ratio != 0.0);
    }

    #[test]
    fn test_monthly_statistics() {
        // 1 月底 100，2 月底 110，3 月底 99
        let mut prices = vec![100.0; 31];
        prices.extend(vec![110.0; 29]);
        prices.extend(vec![99.0; 31]);
        let curve = curve_from(jan_1(), &prices);

        let monthly = monthly_returns(&curve);
        assert_eq!(monthly.len(), 2);
        assert!((monthly[0] - 10.0).abs() < 1e-9);
        assert!((monthly[1] + 10.0).abs() < 1e-9);

        let metrics = MetricsEngine::new().compute(&curve, 100.0).unwrap();
        assert!((metrics.best_month - 10.0).abs() < 1e-9);
        assert!((metrics.worst_month + 10.0).abs() < 1e-9);
        assert_eq!(metrics.positive_months, 1);
        assert_eq!(metrics.total_months, 2);
    }

    #[test]
    fn test_descriptions_cover_metric_fields() {
        let keys: Vec<&str> = metric_descriptions().iter().map(|(k, _)| *k).collect();
        for key in ["total_return_pct", "cagr", "sharpe_ratio", "max_drawdown", "rebalancing"] {
            assert!(keys.contains(&key), "缺少 {}", key);
        }
    }
}
