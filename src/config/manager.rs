use config::{Config, ConfigError};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::loader::{ConfigLoader, Environment};
use crate::config::types::ApplicationConfig;
use crate::config::validation::validate_config;

// 全局配置實例
static CONFIG: OnceCell<ApplicationConfig> = OnceCell::new();

/// 獲取應用程序配置實例
///
/// 若尚未初始化則立即從環境加載，加載失敗時返回錯誤。
pub fn get_config() -> Result<&'static ApplicationConfig, ConfigError> {
    CONFIG.get_or_try_init(ApplicationConfig::load_from_env)
}

/// 初始化配置（在應用程序啟動時調用）
pub fn init_config() -> Result<&'static ApplicationConfig, ConfigError> {
    let app_config = ApplicationConfig::load_from_env()?;

    // 嘗試初始化全局配置
    if CONFIG.set(app_config).is_err() {
        warn!("配置已經被初始化，跳過重複初始化");
    } else {
        debug!("配置初始化成功，環境：{:?}", Environment::from_env());
    }

    get_config()
}

/// ApplicationConfig 加載方法實現
impl ApplicationConfig {
    /// 從環境變數指定的環境加載配置
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let env = Environment::from_env();
        debug!("從環境加載配置: {:?}", env);
        Self::load(env)
    }

    /// 從指定環境加載配置
    pub fn load(env: Environment) -> Result<Self, ConfigError> {
        Self::finish(ConfigLoader::load(env)?)
    }

    /// 從指定目錄加載配置
    pub fn load_from_dir(dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        Self::finish(ConfigLoader::load_from_dir(dir, env)?)
    }

    fn finish(source: Config) -> Result<Self, ConfigError> {
        let app_config: ApplicationConfig = source.try_deserialize()?;

        // 驗證失敗視為配置錯誤
        validate_config(&app_config)
            .map_err(|err| ConfigError::Message(format!("配置驗證失敗: {}", err)))?;
        debug!("配置驗證通過");

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_environment_configuration() {
        // 設置測試環境
        env::set_var(crate::config::loader::ENV_VAR, "development");
        env::remove_var("CONFIG_DIR");

        // 測試加載配置
        let config = ApplicationConfig::load_from_env().expect("無法加載測試配置");

        // 驗證開發環境特定配置
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.backtest.risk_free_rate, 0.0);
        assert!(config.cache.enabled);

        // 清理環境變數
        env::remove_var(crate::config::loader::ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("production.toml"),
            "[log]\nlevel = \"verbose\"\n\n[data]\nfunds_file = \"f.csv\"\nfund_prices_file = \"p.csv\"\nbitcoin_prices_file = \"b.csv\"\n",
        )
        .unwrap();

        let err = ApplicationConfig::load_from_dir(dir.path(), Environment::Production).unwrap_err();
        assert!(err.to_string().contains("log.level"));
    }
}
