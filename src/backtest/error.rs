use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ValidationError;

/// 回測錯誤類型
///
/// 所有錯誤都可由調用方處理；失敗的回測不返回任何部分結果。
#[derive(Error, Debug)]
pub enum BacktestError {
    /// 開始日期不早於結束日期
    #[error("開始日期 {start} 必須早於結束日期 {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// 基金目錄中找不到指定基金
    #[error("找不到 ID 為 {0} 的 PPR 基金")]
    FundNotFound(Uuid),

    /// 日期範圍內沒有足夠的歷史數據
    #[error("歷史數據不足: {0}")]
    InsufficientData(String),

    /// 請求驗證錯誤
    #[error("請求驗證失敗: {0}")]
    Validation(#[from] ValidationError),

    /// 數據來源（基金目錄或價格服務）錯誤
    #[error("數據來源錯誤: {0}")]
    DataSource(String),
}

impl BacktestError {
    /// 對應到展示層使用的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            BacktestError::InvalidDateRange { .. } | BacktestError::Validation(_) => 400,
            BacktestError::FundNotFound(_) => 404,
            BacktestError::InsufficientData(_) => 422,
            BacktestError::DataSource(_) => 502,
        }
    }

    /// 將數據來源的錯誤包裝為回測錯誤
    pub fn data_source(err: anyhow::Error) -> Self {
        BacktestError::DataSource(format!("{:#}", err))
    }
}

/// 回測引擎結果類型別名
pub type EngineResult<T> = Result<T, BacktestError>;
