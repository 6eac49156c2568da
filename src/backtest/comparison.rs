//! 多投資組合比較匯總

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::backtest::results::{BacktestResult, PerformanceMetrics};

/// 推薦投資組合的固定理由
pub const RECOMMENDATION_REASON: &str = "highest risk-adjusted return";

/// 參與比較的指標，宣告順序即輸出順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparedMetric {
    TotalReturnPct,
    Cagr,
    Volatility,
    SharpeRatio,
    MaxDrawdown,
    FinalValue,
}

impl ComparedMetric {
    pub const ALL: [ComparedMetric; 6] = [
        ComparedMetric::TotalReturnPct,
        ComparedMetric::Cagr,
        ComparedMetric::Volatility,
        ComparedMetric::SharpeRatio,
        ComparedMetric::MaxDrawdown,
        ComparedMetric::FinalValue,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ComparedMetric::TotalReturnPct => "total_return_pct",
            ComparedMetric::Cagr => "cagr",
            ComparedMetric::Volatility => "volatility",
            ComparedMetric::SharpeRatio => "sharpe_ratio",
            ComparedMetric::MaxDrawdown => "max_drawdown",
            ComparedMetric::FinalValue => "final_value",
        }
    }

    /// 數值越大越好；波動率與最大回撤取最小值
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, ComparedMetric::Volatility | ComparedMetric::MaxDrawdown)
    }

    pub fn value(&self, metrics: &PerformanceMetrics) -> Decimal {
        match self {
            ComparedMetric::TotalReturnPct => metrics.total_return_pct,
            ComparedMetric::Cagr => metrics.cagr,
            ComparedMetric::Volatility => metrics.volatility,
            ComparedMetric::SharpeRatio => metrics.sharpe_ratio,
            ComparedMetric::MaxDrawdown => metrics.max_drawdown,
            ComparedMetric::FinalValue => metrics.final_value,
        }
    }
}

impl fmt::Display for ComparedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// 單一指標在各投資組合間的比較
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub values: Vec<Decimal>,
    pub best_index: usize,
    pub best_portfolio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedPortfolio {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub portfolios: Vec<String>,
    /// 依 [`ComparedMetric`] 宣告順序排列，序列化為 JSON 文本時保持此順序
    pub metrics_comparison: BTreeMap<ComparedMetric, MetricComparison>,
    pub recommended_portfolio: RecommendedPortfolio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub portfolios: Vec<BacktestResult>,
    pub comparison_summary: ComparisonSummary,
}

/// 找出最佳值的索引，相同時取最小索引
fn best_index(values: &[Decimal], higher_is_better: bool) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        let better = if higher_is_better {
            *value > values[best]
        } else {
            *value < values[best]
        };
        if better {
            best = idx;
        }
    }
    best
}

/// 以四捨五入後的指標值建立比較匯總
pub fn build_comparison_summary(results: &[BacktestResult], names: &[String]) -> ComparisonSummary {
    let name_of = |idx: usize| names.get(idx).cloned().unwrap_or_default();

    let metrics_comparison = ComparedMetric::ALL
        .iter()
        .map(|metric| {
            let values: Vec<Decimal> = results.iter().map(|r| metric.value(&r.metrics)).collect();
            let best = best_index(&values, metric.higher_is_better());
            (
                *metric,
                MetricComparison {
                    values,
                    best_index: best,
                    best_portfolio: name_of(best),
                },
            )
        })
        .collect();

    let sharpe: Vec<Decimal> = results.iter().map(|r| r.metrics.sharpe_ratio).collect();
    let recommended = best_index(&sharpe, true);

    ComparisonSummary {
        portfolios: names.to_vec(),
        metrics_comparison,
        recommended_portfolio: RecommendedPortfolio {
            index: recommended,
            name: name_of(recommended),
            reason: RECOMMENDATION_REASON.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_best_index_direction_and_ties() {
        let values = [dec!(1.5), dec!(3.2), dec!(3.2), dec!(-0.4)];
        assert_eq!(best_index(&values, true), 1);
        assert_eq!(best_index(&values, false), 3);
        assert_eq!(best_index(&[dec!(0), dec!(0)], true), 0);
    }

    #[test]
    fn test_metric_keys_and_direction() {
        assert_eq!(ComparedMetric::TotalReturnPct.key(), "total_return_pct");
        assert!(ComparedMetric::SharpeRatio.higher_is_better());
        assert!(!ComparedMetric::Volatility.higher_is_better());
        assert!(!ComparedMetric::MaxDrawdown.higher_is_better());
        assert_eq!(
            serde_json::to_value(ComparedMetric::FinalValue).unwrap(),
            serde_json::json!("final_value")
        );
    }
}
