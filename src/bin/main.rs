use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ppr_backtest::backtest::{metric_descriptions, BacktestEngine};
use ppr_backtest::config::{self, ApplicationConfig, LogConfig};
use ppr_backtest::data_provider::{CachedPriceProvider, CsvDataLoader, InMemoryDataStore};
use ppr_backtest::domain_types::{BacktestRequest, ComparisonRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// PPR 基金與比特幣投資組合回測工具
#[derive(Parser)]
#[command(name = "ppr_backtest", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 執行單次回測
    Calculate {
        /// 回測請求 JSON 檔案，`-` 表示標準輸入
        #[arg(short, long)]
        request: PathBuf,
    },
    /// 比較 2 至 5 個投資組合
    Compare {
        /// 比較請求 JSON 檔案，`-` 表示標準輸入
        #[arg(short, long)]
        request: PathBuf,
    },
    /// 列出基金目錄
    Funds,
    /// 列出指標說明
    Metrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化配置
    let app_config = config::init_config()?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    match cli.command {
        Command::Calculate { request } => {
            let request: BacktestRequest = read_request(&request)?;
            let store = load_store(app_config).await?;
            let engine = build_engine(app_config, store);

            let result = engine.calculate(&request).await.map_err(|e| {
                error!("回測失敗: {}", e);
                anyhow!("[{}] {}", e.status_code(), e)
            })?;
            print_json(&result)?;
        }
        Command::Compare { request } => {
            let request: ComparisonRequest = read_request(&request)?;
            let store = load_store(app_config).await?;
            let engine = build_engine(app_config, store);

            let result = engine.compare(&request).await.map_err(|e| {
                error!("比較失敗: {}", e);
                anyhow!("[{}] {}", e.status_code(), e)
            })?;
            print_json(&result)?;
        }
        Command::Funds => {
            let store = load_store(app_config).await?;
            print_json(&store.funds())?;
        }
        Command::Metrics => {
            let descriptions: serde_json::Map<String, serde_json::Value> = metric_descriptions()
                .into_iter()
                .map(|(metric, description)| (metric.to_string(), description.into()))
                .collect();
            print_json(&descriptions)?;
        }
    }

    Ok(())
}

/// 從 CSV 檔案加載數據（檔案 I/O 在阻塞線程池中執行）
async fn load_store(app_config: &ApplicationConfig) -> Result<Arc<InMemoryDataStore>> {
    let loader = CsvDataLoader::from_config(&app_config.data);
    let store = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("數據加載任務異常結束")??;
    Ok(Arc::new(store))
}

fn build_engine(app_config: &ApplicationConfig, store: Arc<InMemoryDataStore>) -> BacktestEngine {
    let engine = if app_config.cache.enabled {
        info!(
            "啟用價格快取: 容量 {}, TTL {} 秒",
            app_config.cache.capacity, app_config.cache.ttl_secs
        );
        let prices = CachedPriceProvider::from_config(store.clone(), &app_config.cache);
        BacktestEngine::new(store, Arc::new(prices))
    } else {
        BacktestEngine::from_source(store)
    };

    engine.with_risk_free_rate(app_config.backtest.risk_free_rate)
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("無法讀取標準輸入")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("無法讀取請求檔案 {}", path.display()))?
    };

    serde_json::from_str(&content).context("請求格式無效")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(log_config: &LogConfig) -> Result<()> {
    // RUST_LOG 優先，否則使用配置中的級別
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_config.level.to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if log_config.is_json() {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.pretty().finish())
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}
