//! 時間序列對齊
//!
//! 將各資產獨立的日價格序列合併到同一條日期軸上：
//! 先截取請求的日期窗口，再按日期外連接，缺值以該資產最近一次觀測值向前填充，
//! 仍無法填充的日期（任何資產尚未有首筆觀測）整行丟棄。

use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

use crate::backtest::error::{BacktestError, EngineResult};
use crate::domain_types::{window_slice, AssetId, AssetSeries, Dated};

/// 對齊後的一行：日期與各資產欄位的價格
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    /// 與 `AlignedSeries::assets()` 順序一致
    pub prices: Vec<f64>,
}

impl Dated for AlignedRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// 共用日期軸上的多資產價格表
///
/// 不變量：日期嚴格遞增，每一行每個欄位都有價格，至少一行。
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    assets: Vec<AssetId>,
    rows: Vec<AlignedRow>,
}

impl AlignedSeries {
    /// 由已對齊的行直接構造，並檢查不變量
    pub fn new(assets: Vec<AssetId>, rows: Vec<AlignedRow>) -> EngineResult<Self> {
        if rows.is_empty() {
            return Err(BacktestError::InsufficientData("對齊結果沒有任何行".to_string()));
        }

        let complete = rows.iter().all(|row| {
            row.prices.len() == assets.len() && row.prices.iter().all(|p| p.is_finite() && *p > 0.0)
        });
        let ordered = rows.windows(2).all(|pair| pair[0].date < pair[1].date);
        if !complete || !ordered {
            return Err(BacktestError::InsufficientData(
                "對齊結果含有缺值或日期未嚴格遞增".to_string(),
            ));
        }

        Ok(Self { assets, rows })
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 資產所在欄位索引
    pub fn column(&self, asset: AssetId) -> Option<usize> {
        self.assets.iter().position(|a| *a == asset)
    }

    /// 按日期查找行
    pub fn row_at(&self, date: NaiveDate) -> Option<&AlignedRow> {
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// 指定日期與資產的價格
    pub fn price(&self, date: NaiveDate, asset: AssetId) -> Option<f64> {
        let column = self.column(asset)?;
        self.row_at(date).map(|row| row.prices[column])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|row| row.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|row| row.date)
    }
}

/// 對齊多個資產的價格序列
///
/// 任一資產在窗口內沒有觀測值，或對齊後沒有任何完整的行，都返回
/// `InsufficientData`。
pub fn align_series(
    series: &[AssetSeries],
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<AlignedSeries> {
    if series.is_empty() {
        return Err(BacktestError::InsufficientData(
            "沒有任何資產需要對齊".to_string(),
        ));
    }

    let mut windows = Vec::with_capacity(series.len());
    for s in series {
        let window = window_slice(s.points(), start, end);
        if window.is_empty() {
            return Err(BacktestError::InsufficientData(format!(
                "{} 在 {} 至 {} 之間沒有歷史數據",
                s.asset(),
                start,
                end
            )));
        }
        windows.push(window);
    }

    let all_dates: BTreeSet<NaiveDate> = windows
        .iter()
        .flat_map(|w| w.iter().map(|p| p.date))
        .collect();

    let mut cursors = vec![0usize; windows.len()];
    let mut last_known: Vec<Option<f64>> = vec![None; windows.len()];
    let mut rows = Vec::with_capacity(all_dates.len());

    for date in &all_dates {
        for (col, window) in windows.iter().enumerate() {
            while cursors[col] < window.len() && window[cursors[col]].date <= *date {
                last_known[col] = Some(window[cursors[col]].price);
                cursors[col] += 1;
            }
        }

        // 任何欄位尚無觀測值的日期整行丟棄
        let prices: Option<Vec<f64>> = last_known.iter().copied().collect();
        if let Some(prices) = prices {
            rows.push(AlignedRow { date: *date, prices });
        }
    }

    debug!(
        "對齊完成: {} 個資產, {} 個日期, 丟棄 {} 個不完整日期",
        series.len(),
        rows.len(),
        all_dates.len() - rows.len()
    );

    if rows.is_empty() {
        return Err(BacktestError::InsufficientData(format!(
            "{} 至 {} 之間沒有重疊的數據",
            start, end
        )));
    }

    Ok(AlignedSeries {
        assets: series.iter().map(|s| s.asset()).collect(),
        rows,
    })
}
