use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{AppConfig, CargoEnv};

pub struct Logger;
impl Logger {
    pub fn from_config(config: &AppConfig) -> WorkerGuard {
        Self::new_with_log_dir(config.cargo_env, config.log_dir.clone(), &config.rust_log)
    }

    pub fn new_with_log_dir(cargo_env: CargoEnv, log_dir: Option<PathBuf>, default_filter: &str) -> WorkerGuard {
        let (non_blocking, guard) = match cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => {
                let log_directory = Self::get_log_directory(log_dir);

                // 确保日志目录存在
                if let Err(e) = std::fs::create_dir_all(&log_directory) {
                    eprintln!("⚠️ 无法创建日志目录 {:?}: {}，回退到标准输出", log_directory, e);
                    tracing_appender::non_blocking(std::io::stdout())
                } else {
                    let file_logger = tracing_appender::rolling::daily(&log_directory, "log");
                    tracing_appender::non_blocking(file_logger)
                }
            }
        };

        // env var: `RUST_LOG`
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{},referral=debug,artisan=debug", default_filter).into());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .init();

        guard
    }

    fn get_log_directory(log_dir: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = log_dir {
            return dir;
        }

        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                return exe_dir.join("logs");
            }
        }

        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_log_dir_wins() {
        let dir = Logger::get_log_directory(Some(PathBuf::from("/tmp/artisan-logs")));
        assert_eq!(dir, PathBuf::from("/tmp/artisan-logs"));
    }

    #[test]
    fn test_fallback_log_dir_ends_with_logs() {
        let dir = Logger::get_log_directory(None);
        assert!(dir.ends_with("logs"));
    }
}
