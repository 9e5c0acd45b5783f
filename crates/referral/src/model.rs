use crate::error::{ErrorKind, ReferralError};
use serde::{Deserialize, Serialize};

/// 发往推荐服务的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest {
    /// 被推荐人邮箱
    pub referee_email: String,
    /// 商家ID
    pub vendor_id: String,
}

impl ReferralRequest {
    /// 两个字段都必须非空
    pub fn new(referee_email: impl Into<String>, vendor_id: impl Into<String>) -> Option<Self> {
        let referee_email = referee_email.into();
        let vendor_id = vendor_id.into();
        if referee_email.trim().is_empty() || vendor_id.trim().is_empty() {
            return None;
        }
        Some(Self {
            referee_email,
            vendor_id,
        })
    }
}

/// 一次生成尝试的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ReferralResult {
    Pending,
    Ready { link: String },
    Failed { reason: ErrorKind, message: String },
}

impl ReferralResult {
    pub fn failed(err: &ReferralError) -> Self {
        ReferralResult::Failed {
            reason: err.kind(),
            message: err.user_message(),
        }
    }

    pub fn status(&self) -> ReferralStatus {
        match self {
            ReferralResult::Pending => ReferralStatus::Pending,
            ReferralResult::Ready { .. } => ReferralStatus::Ready,
            ReferralResult::Failed { .. } => ReferralStatus::Failed,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            ReferralResult::Ready { link } => Some(link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralStatus {
    Pending,
    Ready,
    Failed,
}

/// 交给展示层渲染的快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralView {
    pub status: ReferralStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub copied: bool,
    pub generating: bool,
}

impl ReferralView {
    pub fn from_parts(result: &ReferralResult, copied: bool, generating: bool) -> Self {
        let error_message = match result {
            ReferralResult::Failed { message, .. } => Some(message.clone()),
            _ => None,
        };
        Self {
            status: result.status(),
            link: result.link().map(str::to_string),
            error_message,
            copied,
            generating,
        }
    }
}

impl Default for ReferralView {
    fn default() -> Self {
        Self::from_parts(&ReferralResult::Pending, false, false)
    }
}
