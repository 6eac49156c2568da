#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use ppr_backtest::data_provider::InMemoryDataStore;
use ppr_backtest::domain_types::{
    AllocationSpec, AssetId, AssetSeries, BacktestRequest, FundAllocation, FundMetadata,
    PricePoint, RebalancingFrequency,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 以每日價格函數生成連續 `days` 天的序列
pub fn daily_series(
    asset: AssetId,
    start: NaiveDate,
    days: i64,
    price: impl Fn(i64) -> f64,
) -> AssetSeries {
    let points = (0..days)
        .map(|i| PricePoint::new(start + Duration::days(i), price(i)))
        .collect();
    AssetSeries::new(asset, points).unwrap()
}

/// 每 `step` 天才公布一次淨值的基金
pub fn sparse_series(asset: AssetId, start: NaiveDate, days: i64, step: i64, price: f64) -> AssetSeries {
    let points = (0..days)
        .step_by(step as usize)
        .map(|i| PricePoint::new(start + Duration::days(i), price))
        .collect();
    AssetSeries::new(asset, points).unwrap()
}

pub fn fund_metadata(id: Uuid, name: &str) -> FundMetadata {
    FundMetadata::new(id, name, "Gestora de Teste")
}

/// 平穩增長、波動很小的基金
pub fn steady_fund_price(i: i64) -> f64 {
    10.0 * 1.0002f64.powi(i as i32) * (1.0 + 0.001 * (i as f64).sin())
}

/// 沒有趨勢、波動劇烈的比特幣
pub fn volatile_bitcoin_price(i: i64) -> f64 {
    20_000.0 * (1.0 + 0.3 * (i as f64 / 5.0).sin())
}

/// 一個基金加比特幣的內存數據源
pub fn fund_and_bitcoin_store(fund: Uuid, start: NaiveDate, days: i64) -> InMemoryDataStore {
    InMemoryDataStore::new()
        .with_fund(
            fund_metadata(fund, "PPR Estável"),
            daily_series(AssetId::Fund(fund), start, days, steady_fund_price),
        )
        .with_bitcoin(daily_series(AssetId::Bitcoin, start, days, volatile_bitcoin_price))
}

pub fn request(
    funds: &[(Uuid, Decimal)],
    bitcoin: Decimal,
    start: NaiveDate,
    end: NaiveDate,
    frequency: RebalancingFrequency,
) -> BacktestRequest {
    let allocation = AllocationSpec::new(
        funds.iter().map(|(id, pct)| FundAllocation::new(*id, *pct)).collect(),
        bitcoin,
    )
    .unwrap();
    BacktestRequest::new(allocation, dec!(10000), start)
        .unwrap()
        .with_end_date(end)
        .with_rebalancing(frequency)
}
