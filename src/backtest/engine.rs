//! 回測協調器
//!
//! 公開入口：驗證日期範圍、解析基金、加載價格，之後依序執行
//! 對齊 → 估值循環 → 指標計算，並組裝結果。只有加載階段是異步的。

use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backtest::aligner::align_series;
use crate::backtest::comparison::{build_comparison_summary, ComparisonResult};
use crate::backtest::error::{BacktestError, EngineResult};
use crate::backtest::metrics::MetricsEngine;
use crate::backtest::results::{
    build_allocation_breakdown, build_historical_data, BacktestResult, PerformanceMetrics,
};
use crate::backtest::valuation::run_valuation;
use crate::data_provider::{FundCatalog, PriceHistoryProvider};
use crate::domain_types::{AssetSeries, BacktestRequest, ComparisonRequest, FundMetadata};
use crate::utils::{decimal_to_f64, today};

/// 投資組合回測引擎
///
/// 引擎本身不持有可變狀態，可在多個任務間共享並行執行。
#[derive(Clone)]
pub struct BacktestEngine {
    catalog: Arc<dyn FundCatalog>,
    prices: Arc<dyn PriceHistoryProvider>,
    metrics: MetricsEngine,
}

impl BacktestEngine {
    pub fn new(catalog: Arc<dyn FundCatalog>, prices: Arc<dyn PriceHistoryProvider>) -> Self {
        Self {
            catalog,
            prices,
            metrics: MetricsEngine::default(),
        }
    }

    /// 以同時提供基金目錄與價格的數據源創建
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: FundCatalog + PriceHistoryProvider + 'static,
    {
        Self::new(source.clone(), source)
    }

    /// 設定計算夏普與索提諾比率使用的年化無風險利率（%）
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.metrics = MetricsEngine::with_risk_free_rate(risk_free_rate);
        self
    }

    pub fn metrics_engine(&self) -> &MetricsEngine {
        &self.metrics
    }

    /// 執行單次回測，未指定結束日期時使用今天
    pub async fn calculate(&self, request: &BacktestRequest) -> EngineResult<BacktestResult> {
        self.calculate_as_of(request, today()).await
    }

    /// 以指定的「今天」執行單次回測
    pub async fn calculate_as_of(
        &self,
        request: &BacktestRequest,
        today: NaiveDate,
    ) -> EngineResult<BacktestResult> {
        let start = request.start_date();
        let end = request.end_date().unwrap_or(today);
        if start >= end {
            return Err(BacktestError::InvalidDateRange { start, end });
        }

        let allocation = request.allocation();
        info!(
            "開始回測: {} 至 {}, {} 個基金, 比特幣 {}%, 再平衡 {}",
            start,
            end,
            allocation.fund_allocations().len(),
            allocation.bitcoin_percentage(),
            request.rebalancing_frequency().display_name()
        );

        let funds = self.resolve_funds(allocation.fund_ids()).await?;
        let series = self.fetch_series(request, start, end).await?;

        let aligned = align_series(&series, start, end)?;
        debug!(
            "對齊後 {} 行 ({:?} 至 {:?})",
            aligned.len(),
            aligned.first_date(),
            aligned.last_date()
        );

        let initial_investment = decimal_to_f64(request.initial_investment());
        let curve = run_valuation(
            &aligned,
            allocation,
            initial_investment,
            request.rebalancing_frequency(),
        )?;

        let values = self.metrics.compute(&curve, initial_investment)?;
        let final_point = curve
            .last()
            .ok_or_else(|| BacktestError::InsufficientData("價值曲線為空".to_string()))?;
        let allocation_breakdown =
            build_allocation_breakdown(allocation, &funds, final_point, initial_investment);

        info!(
            "回測完成: 期末價值 {:.2}, 總報酬 {:.2}%, 夏普 {:.2}",
            values.final_value, values.total_return_pct, values.sharpe_ratio
        );

        Ok(BacktestResult {
            portfolio_config: request.clone(),
            metrics: PerformanceMetrics::from(&values),
            historical_data: build_historical_data(&curve),
            allocation_breakdown,
            calculation_date: today,
        })
    }

    /// 比較多個投資組合，任一回測失敗則整體失敗
    pub async fn compare(&self, request: &ComparisonRequest) -> EngineResult<ComparisonResult> {
        self.compare_as_of(request, today()).await
    }

    pub async fn compare_as_of(
        &self,
        request: &ComparisonRequest,
        today: NaiveDate,
    ) -> EngineResult<ComparisonResult> {
        let names = request.names();
        info!("開始比較 {} 個投資組合", names.len());

        let portfolios = try_join_all(
            request
                .portfolios()
                .iter()
                .map(|portfolio| self.calculate_as_of(portfolio, today)),
        )
        .await?;

        let comparison_summary = build_comparison_summary(&portfolios, &names);
        info!(
            "比較完成，推薦投資組合: {} (#{})",
            comparison_summary.recommended_portfolio.name,
            comparison_summary.recommended_portfolio.index
        );

        Ok(ComparisonResult {
            portfolios,
            comparison_summary,
        })
    }

    /// 按配置順序解析基金，第一個找不到的基金即失敗
    async fn resolve_funds(
        &self,
        fund_ids: impl Iterator<Item = Uuid>,
    ) -> EngineResult<Vec<FundMetadata>> {
        let mut funds = Vec::new();
        for fund_id in fund_ids {
            let fund = self
                .catalog
                .get_fund(fund_id)
                .await
                .map_err(BacktestError::data_source)?
                .ok_or(BacktestError::FundNotFound(fund_id))?;
            funds.push(fund);
        }
        Ok(funds)
    }

    /// 加載所有需要的價格序列：基金按配置順序，比特幣（若比例大於 0）在最後
    async fn fetch_series(
        &self,
        request: &BacktestRequest,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AssetSeries>> {
        let allocation = request.allocation();

        let mut series = try_join_all(allocation.fund_ids().map(|fund_id| async move {
            let series = self
                .prices
                .load_fund_series(fund_id, start, end)
                .await
                .map_err(BacktestError::data_source)?;
            ensure_not_empty(series, start, end)
        }))
        .await?;

        if allocation.has_bitcoin() {
            let bitcoin = self
                .prices
                .load_bitcoin_series(start, end)
                .await
                .map_err(BacktestError::data_source)?;
            series.push(ensure_not_empty(bitcoin, start, end)?);
        }

        for s in &series {
            debug!("{}: {} 筆價格", s.asset(), s.len());
        }
        Ok(series)
    }
}

fn ensure_not_empty(series: AssetSeries, start: NaiveDate, end: NaiveDate) -> EngineResult<AssetSeries> {
    if series.is_empty() {
        return Err(BacktestError::InsufficientData(format!(
            "{} 在 {} 至 {} 之間沒有歷史數據",
            series.asset(),
            start,
            end
        )));
    }
    Ok(series)
}
