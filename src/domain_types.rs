//! 領域類型模組
//!
//! 定義回測核心使用的資產、價格序列、基金目錄、配置與請求類型。

pub mod allocation;
pub mod asset;
pub mod frequency;
pub mod fund;
pub mod request;
pub mod series;

pub use allocation::{AllocationSpec, FundAllocation, ALLOCATION_TOLERANCE};
pub use asset::AssetId;
pub use frequency::RebalancingFrequency;
pub use fund::FundMetadata;
pub use request::{BacktestRequest, ComparisonRequest, DEFAULT_INITIAL_INVESTMENT};
pub use series::{window_slice, AssetSeries, Dated, PricePoint};
