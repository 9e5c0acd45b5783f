use anyhow::{Context, Result};
use clap::Parser;
use referral::{
    CommandClipboard, FileStore, HttpReferralApi, OrderContext, ProvisionerSettings, ReferralProvisioner,
    ReferralResult, SessionContext,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utils::{AppConfig, Logger};

#[derive(clap::Parser)]
#[clap(name = "artisan", about = "为刚完成的订单生成可分享的推荐链接")]
struct Cli {
    #[clap(flatten)]
    config: AppConfig,

    /// 生成成功后复制到系统剪贴板
    #[clap(long)]
    copy: bool,

    /// 页面跳转时带过来的订单快照（JSON），缺省时读取存储中的 lastOrder
    #[clap(long)]
    order_json: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 根据 CARGO_ENV 加载对应的环境配置文件
    utils::EnvLoader::load_env_file().ok();
    let cli = Cli::parse();
    let guard = Logger::from_config(&cli.config);

    let artisan = Artisan::new(cli).await?;
    let failed = artisan.run().await?;

    drop(guard);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

pub struct Artisan {
    provisioner: ReferralProvisioner,
    session: SessionContext,
    order: OrderContext,
    copy: bool,
}

impl Artisan {
    async fn new(cli: Cli) -> Result<Self> {
        let config = Arc::new(cli.config);

        let store = Arc::new(
            FileStore::open(&config.storage_path)
                .await
                .with_context(|| format!("🔴 Failed to open store {:?}", config.storage_path))?,
        );

        let session = SessionContext::from_store(store.as_ref())
            .await
            .context("🔴 Failed to read session")?;

        let navigation = cli
            .order_json
            .as_deref()
            .map(|raw| serde_json::from_str::<Value>(raw))
            .transpose()
            .context("🔴 --order-json is not valid JSON")?;

        let order = OrderContext::resolve(navigation.as_ref(), store.as_ref())
            .await
            .context("🔴 Failed to read order")?;

        let provisioner = ReferralProvisioner::new(
            Arc::new(HttpReferralApi::from_config(&config)),
            store,
            Arc::new(CommandClipboard::detect()),
            ProvisionerSettings::from(&*config),
        );

        Ok(Self {
            provisioner,
            session,
            order,
            copy: cli.copy,
        })
    }

    /// 返回本次是否生成失败
    async fn run(self) -> Result<bool> {
        info!("🎯 开始生成推荐链接");

        let result = self.provisioner.generate(self.session.clone(), self.order.clone()).await;

        if self.copy && matches!(result, ReferralResult::Ready { .. }) && !self.provisioner.copy_link().await {
            error!("❌ 复制推荐链接失败，链接仍可手动复制");
        }

        let view = self.provisioner.view();
        println!("{}", serde_json::to_string_pretty(&view)?);

        self.provisioner.shutdown().await;

        Ok(matches!(result, ReferralResult::Failed { .. }))
    }
}
