use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{ValidationError, ValidationUtils};
use crate::domain_types::{AllocationSpec, FundAllocation, RebalancingFrequency};

/// 預設初始投資金額（歐元）
pub const DEFAULT_INITIAL_INVESTMENT: Decimal = dec!(10000);

/// 比較請求允許的投資組合數量
pub const MIN_COMPARISON_PORTFOLIOS: usize = 2;
pub const MAX_COMPARISON_PORTFOLIOS: usize = 5;

fn default_initial_investment() -> Decimal {
    DEFAULT_INITIAL_INVESTMENT
}

/// 單次回測請求
///
/// 透過 `new` 或反序列化構造時都會驗證；結束日期早於開始日期屬於回測期錯誤，
/// 由引擎在計算時檢查（結束日期可省略，預設為今天）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BacktestRequestDef", into = "BacktestRequestDef")]
pub struct BacktestRequest {
    allocation: AllocationSpec,
    initial_investment: Decimal,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    rebalancing_frequency: RebalancingFrequency,
}

impl BacktestRequest {
    /// 創建回測請求，比特幣 0% 以外的欄位使用預設值
    pub fn new(
        allocation: AllocationSpec,
        initial_investment: Decimal,
        start_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        ValidationUtils::positive(initial_investment, Decimal::ZERO, "initial_investment")?;

        Ok(Self {
            allocation,
            initial_investment,
            start_date,
            end_date: None,
            rebalancing_frequency: RebalancingFrequency::default(),
        })
    }

    /// 設定結束日期
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// 設定再平衡頻率
    pub fn with_rebalancing(mut self, frequency: RebalancingFrequency) -> Self {
        self.rebalancing_frequency = frequency;
        self
    }

    pub fn allocation(&self) -> &AllocationSpec {
        &self.allocation
    }

    pub fn initial_investment(&self) -> Decimal {
        self.initial_investment
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn rebalancing_frequency(&self) -> RebalancingFrequency {
        self.rebalancing_frequency
    }
}

/// 回測請求的序列化格式
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BacktestRequestDef {
    fund_allocations: Vec<FundAllocation>,
    #[serde(default)]
    bitcoin_percentage: Decimal,
    #[serde(default = "default_initial_investment")]
    initial_investment: Decimal,
    start_date: NaiveDate,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    rebalancing_frequency: RebalancingFrequency,
}

impl TryFrom<BacktestRequestDef> for BacktestRequest {
    type Error = ValidationError;

    fn try_from(def: BacktestRequestDef) -> Result<Self, Self::Error> {
        let allocation = AllocationSpec::new(def.fund_allocations, def.bitcoin_percentage)?;
        let request = BacktestRequest::new(allocation, def.initial_investment, def.start_date)?
            .with_rebalancing(def.rebalancing_frequency);

        Ok(match def.end_date {
            Some(end) => request.with_end_date(end),
            None => request,
        })
    }
}

impl From<BacktestRequest> for BacktestRequestDef {
    fn from(request: BacktestRequest) -> Self {
        Self {
            bitcoin_percentage: request.allocation.bitcoin_percentage(),
            fund_allocations: request.allocation.fund_allocations().to_vec(),
            initial_investment: request.initial_investment,
            start_date: request.start_date,
            end_date: request.end_date,
            rebalancing_frequency: request.rebalancing_frequency,
        }
    }
}

/// 多投資組合比較請求（2 至 5 個）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ComparisonRequestDef", into = "ComparisonRequestDef")]
pub struct ComparisonRequest {
    portfolios: Vec<BacktestRequest>,
    portfolio_names: Option<Vec<String>>,
}

impl ComparisonRequest {
    pub fn new(
        portfolios: Vec<BacktestRequest>,
        portfolio_names: Option<Vec<String>>,
    ) -> Result<Self, ValidationError> {
        ValidationUtils::in_range(
            portfolios.len(),
            MIN_COMPARISON_PORTFOLIOS,
            MAX_COMPARISON_PORTFOLIOS,
            "portfolios",
        )?;

        if let Some(names) = &portfolio_names {
            if names.len() != portfolios.len() {
                return Err(ValidationError::InvalidValue(format!(
                    "portfolio_names 數量 ({}) 與 portfolios 數量 ({}) 不一致",
                    names.len(),
                    portfolios.len()
                )));
            }
        }

        Ok(Self {
            portfolios,
            portfolio_names,
        })
    }

    pub fn portfolios(&self) -> &[BacktestRequest] {
        &self.portfolios
    }

    /// 投資組合顯示名稱，未提供時為 "Portfolio 1"、"Portfolio 2"…
    pub fn names(&self) -> Vec<String> {
        match &self.portfolio_names {
            Some(names) => names.clone(),
            None => (1..=self.portfolios.len())
                .map(|i| format!("Portfolio {}", i))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComparisonRequestDef {
    portfolios: Vec<BacktestRequest>,
    #[serde(default)]
    portfolio_names: Option<Vec<String>>,
}

impl TryFrom<ComparisonRequestDef> for ComparisonRequest {
    type Error = ValidationError;

    fn try_from(def: ComparisonRequestDef) -> Result<Self, Self::Error> {
        ComparisonRequest::new(def.portfolios, def.portfolio_names)
    }
}

impl From<ComparisonRequest> for ComparisonRequestDef {
    fn from(request: ComparisonRequest) -> Self {
        Self {
            portfolios: request.portfolios,
            portfolio_names: request.portfolio_names,
        }
    }
}
