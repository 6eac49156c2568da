use config::{Config, ConfigError, Environment as EnvSource, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// 選擇配置環境的環境變數
pub const ENV_VAR: &str = "PPR_BACKTEST_ENV";

/// 覆蓋配置值的環境變數前綴，例如 `PPR_BACKTEST__LOG__LEVEL=warn`
pub const ENV_PREFIX: &str = "PPR_BACKTEST";

/// 配置目錄覆蓋變數
pub const CONFIG_DIR_VAR: &str = "CONFIG_DIR";

const DEFAULT_CONFIG_DIR: &str = "config";

/// 運行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// 讀取 `PPR_BACKTEST_ENV`，未設定或無法識別時使用開發環境
    pub fn from_env() -> Self {
        env::var(ENV_VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// 對應的配置文件名
    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// 分層配置加載器
///
/// 優先級由低到高：內建預設值、`<dir>/<env>.toml`、`PPR_BACKTEST__*` 環境變數。
pub struct ConfigLoader;

impl ConfigLoader {
    /// 從 `CONFIG_DIR`（預設 `config/`）載入指定環境的配置
    pub fn load(env: Environment) -> Result<Config, ConfigError> {
        let dir = env::var(CONFIG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self::load_from_dir(&dir, env)
    }

    pub fn load_from_dir(dir: &Path, env: Environment) -> Result<Config, ConfigError> {
        Config::builder()
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .set_default("backtest.risk_free_rate", 0.0)?
            .add_source(File::from(dir.join(env.as_filename())))
            .add_source(
                EnvSource::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }
}

/// 按區段名稱反序列化配置
pub trait ConfigExt {
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError>;
}

impl ConfigExt for Config {
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError> {
        self.get(section)
    }
}
