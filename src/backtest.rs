//! 回測核心模組
//!
//! 數據單向流動：價格提供者 → 序列對齊 → 估值循環（持倉追蹤 + 再平衡決策）
//! → 指標計算 → 回測協調器 → 比較匯總。

pub mod aligner;
pub mod comparison;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod position;
pub mod rebalance;
pub mod results;
pub mod valuation;

// 重新導出主要類型和結構
pub use aligner::{align_series, AlignedRow, AlignedSeries};
pub use comparison::{
    build_comparison_summary, ComparedMetric, ComparisonResult, ComparisonSummary,
    MetricComparison, RecommendedPortfolio, RECOMMENDATION_REASON,
};
pub use engine::BacktestEngine;
pub use error::{BacktestError, EngineResult};
pub use metrics::{metric_descriptions, MetricValues, MetricsEngine};
pub use position::{Holdings, PositionTracker};
pub use rebalance::should_rebalance;
pub use results::{AllocationBreakdown, BacktestResult, HistoricalDataPoint, PerformanceMetrics};
pub use valuation::{run_valuation, DailyValue, ValueCurve};
