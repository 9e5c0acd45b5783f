use clap::Parser;
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

/// 环境配置加载器
pub struct EnvLoader;

impl EnvLoader {
    /// 根据 CARGO_ENV 加载对应的环境配置文件
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());
        let env_file = Self::env_file_for(&cargo_env);

        if !std::path::Path::new(env_file).exists() {
            eprintln!("⚠️  配置文件 {} 不存在，尝试加载默认的 .env 文件", env_file);
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ 已加载默认配置文件: .env");
            } else {
                eprintln!("❌ 未找到任何配置文件，使用默认配置");
            }
            return Ok(());
        }

        dotenvy::from_filename(env_file)?;
        println!("✅ 已加载环境配置文件: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }

    fn env_file_for(cargo_env: &str) -> &'static str {
        match cargo_env {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => {
                println!("⚠️  未知的 CARGO_ENV: {}，使用默认的 .env.development", cargo_env);
                ".env.development"
            }
        }
    }
}

#[derive(Parser, Clone, Debug)]
pub struct AppConfig {
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    /// 推荐服务API根地址
    #[clap(long, env, default_value = "http://localhost:5000/api")]
    pub referral_api_url: String,

    /// 推荐服务请求超时（秒）
    #[clap(long, env, default_value = "15")]
    pub referral_api_timeout_secs: u64,

    /// 订单中没有商家信息时使用的默认商家ID
    #[clap(long, env, default_value = "68625f709729ffdfa0f7242d")]
    pub default_vendor_id: String,

    /// 复制成功提示的自动复位时间（毫秒）
    #[clap(long, env, default_value = "2000")]
    pub copied_reset_ms: u64,

    /// 是否允许在已生成链接后重新生成
    #[clap(long, env, default_value = "false")]
    pub allow_refresh_from_ready: bool,

    /// 本地键值存储文件
    #[clap(long, env, default_value = ".referral-store.json")]
    pub storage_path: PathBuf,

    #[clap(long, env, default_value = "info")]
    pub rust_log: String,

    #[clap(long, env)]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// 手动创建配置实例（用于测试）
    pub fn new_for_test() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            referral_api_url: std::env::var("REFERRAL_API_URL").unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            referral_api_timeout_secs: 5,
            default_vendor_id: "68625f709729ffdfa0f7242d".to_string(),
            copied_reset_ms: 2000,
            allow_refresh_from_ready: false,
            storage_path: PathBuf::from(".referral-store.test.json"),
            rust_log: "debug".to_string(),
            log_dir: None,
        }
    }
}
