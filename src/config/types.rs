use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub log: LogConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
    pub data: DataConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.log.validate()?;
        self.backtest.validate()?;
        self.data.validate()?;
        self.cache.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl LogConfig {
    /// 是否輸出 JSON 格式日誌
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.format",
        )?;

        Ok(())
    }
}

/// 回測引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// 年化無風險利率（百分比，例如 2.5 代表 2.5%）
    pub risk_free_rate: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self { risk_free_rate: 0.0 }
    }
}

impl Validator for BacktestSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.risk_free_rate, -100.0, 100.0, "backtest.risk_free_rate")?;

        Ok(())
    }
}

/// CSV 數據來源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub funds_file: PathBuf,
    pub fund_prices_file: PathBuf,
    pub bitcoin_prices_file: PathBuf,
}

impl Validator for DataConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.funds_file.to_string_lossy(), "data.funds_file")?;
        ValidationUtils::not_empty(&self.fund_prices_file.to_string_lossy(), "data.fund_prices_file")?;
        ValidationUtils::not_empty(
            &self.bitcoin_prices_file.to_string_lossy(),
            "data.bitcoin_prices_file",
        )?;

        Ok(())
    }
}

/// 價格序列快取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: u64,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 256,
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    /// 獲取快取存活時間
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Validator for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::check_dependency(self.enabled, self.capacity > 0, "cache.enabled", "cache.capacity")?;

        if self.enabled {
            ValidationUtils::in_range(self.ttl_secs, 1, 86_400, "cache.ttl_secs")?;
        }

        Ok(())
    }
}
