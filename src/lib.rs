// 模組定義
pub mod backtest;
pub mod config;
pub mod data_provider;
pub mod domain_types;
pub mod utils;
