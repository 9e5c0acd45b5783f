use serde::{Deserialize, Serialize};
use thiserror::Error;
use utils::AppError;

/// 推荐链接流程的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 没有登录凭证
    Unauthenticated,
    /// 没有可归属推荐关系的用户身份
    MissingProfile,
    /// 远程调用失败或返回非成功状态
    ServiceError,
    /// 成功响应中没有可用的链接
    MalformedResponse,
    /// 复制失败（不影响链接生成结果）
    ClipboardError,
}

/// Referral 错误类型定义
#[derive(Error, Debug)]
pub enum ReferralError {
    #[error("缺少登录凭证")]
    Unauthenticated,

    #[error("缺少用户邮箱")]
    MissingProfile,

    #[error("推荐服务调用失败: {0}")]
    Service(String),

    #[error("推荐服务响应无效: {0}")]
    MalformedResponse(String),

    #[error("剪贴板错误: {0}")]
    Clipboard(String),

    #[error("存储错误: {0}")]
    Storage(#[from] AppError),
}

impl ReferralError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReferralError::Unauthenticated => ErrorKind::Unauthenticated,
            ReferralError::MissingProfile => ErrorKind::MissingProfile,
            ReferralError::Service(_) | ReferralError::Storage(_) => ErrorKind::ServiceError,
            ReferralError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ReferralError::Clipboard(_) => ErrorKind::ClipboardError,
        }
    }

    /// 展示给用户的提示文案
    pub fn user_message(&self) -> String {
        match self {
            ReferralError::Unauthenticated => "Authentication required. Please log in again.".to_string(),
            ReferralError::MissingProfile => "User email not found. Please log in again.".to_string(),
            ReferralError::MalformedResponse(_) => "Backend did not return a valid referral link.".to_string(),
            ReferralError::Service(detail) => format!("Failed to generate referral link: {}", detail),
            ReferralError::Storage(e) => format!("Failed to generate referral link: {}", e),
            ReferralError::Clipboard(detail) => format!("Failed to copy referral link: {}", detail),
        }
    }
}

impl From<reqwest::Error> for ReferralError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReferralError::Service(format!("请求超时: {}", err))
        } else {
            ReferralError::Service(err.to_string())
        }
    }
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, ReferralError>;
