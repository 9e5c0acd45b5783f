use crate::error::{ReferralError, Result};
use crate::model::ReferralRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info};
use utils::AppConfig;

pub type DynReferralApi = Arc<dyn ReferralApi + Send + Sync>;

/// 远程推荐服务
#[async_trait]
pub trait ReferralApi {
    /// 创建推荐链接，返回未经解释的响应体
    ///
    /// 传输失败和非2xx返回 `ReferralError::Service`；
    /// 2xx 但响应体不是JSON返回 `ReferralError::MalformedResponse`。
    async fn create_referral_link(&self, token: &str, request: &ReferralRequest) -> Result<Value>;
}

/// 推荐服务HTTP客户端
pub struct HttpReferralApi {
    client: Client,
    base_url: String,
}

impl HttpReferralApi {
    pub const CREATE_PATH: &'static str = "/referral-links";

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.referral_api_url.clone(),
            Duration::from_secs(config.referral_api_timeout_secs),
        )
    }

    fn create_url(&self) -> String {
        format!("{}{}", self.base_url, Self::CREATE_PATH)
    }
}

#[async_trait]
impl ReferralApi for HttpReferralApi {
    async fn create_referral_link(&self, token: &str, request: &ReferralRequest) -> Result<Value> {
        let url = self.create_url();

        info!(
            referee_email = %request.referee_email,
            vendor_id = %request.vendor_id,
            "🚀 请求推荐服务: {}", url
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("❌ 发送推荐请求失败: {}", e);
                ReferralError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("❌ 读取推荐响应失败: {}", e);
            ReferralError::from(e)
        })?;

        if !status.is_success() {
            error!("❌ 推荐服务返回错误 ({}): {}", status, body);
            return Err(ReferralError::Service(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        debug!("📨 推荐服务响应: {}", body);

        serde_json::from_str::<Value>(&body).map_err(|e| {
            error!("❌ 解析推荐响应失败: {}", e);
            ReferralError::MalformedResponse(format!("解析响应失败: {}", e))
        })
    }
}
