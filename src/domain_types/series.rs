use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ValidationError;
use crate::domain_types::AssetId;

/// 單日價格觀測值（基金淨值或比特幣歐元價格）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// 為按日期排列的數據點定義日期訪問特徵
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// 擷取 `[start, end]`（含兩端）範圍內的數據點
///
/// 輸入必須已按日期升序排列。
pub fn window_slice<T: Dated>(points: &[T], start: NaiveDate, end: NaiveDate) -> &[T] {
    let from = points.partition_point(|p| p.date() < start);
    let to = points.partition_point(|p| p.date() <= end);
    if from >= to {
        &points[0..0]
    } else {
        &points[from..to]
    }
}

/// 單一資產的日價格序列
///
/// 不變量：日期嚴格遞增，價格為正的有限數值。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSeries {
    asset: AssetId,
    points: Vec<PricePoint>,
}

impl AssetSeries {
    /// 創建價格序列並驗證不變量
    pub fn new(asset: AssetId, points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::InvalidValue(format!(
                    "{} 的價格日期必須嚴格遞增: {} 之後出現 {}",
                    asset, pair[0].date, pair[1].date
                )));
            }
        }

        if let Some(bad) = points.iter().find(|p| !p.price.is_finite() || p.price <= 0.0) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 在 {} 的價格無效: {}",
                asset, bad.date, bad.price
            )));
        }

        Ok(Self { asset, points })
    }

    /// 創建空序列
    pub fn empty(asset: AssetId) -> Self {
        Self {
            asset,
            points: Vec::new(),
        }
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// 獲取數據點數量
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 檢查是否為空
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// 截取 `[start, end]` 範圍內的子序列
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> AssetSeries {
        Self {
            asset: self.asset,
            points: window_slice(&self.points, start, end).to_vec(),
        }
    }
}
