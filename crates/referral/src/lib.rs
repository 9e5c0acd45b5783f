//! 下单成功页的推荐链接生成流程
//!
//! - context: 会话/订单上下文解析
//! - api: 远程推荐服务客户端
//! - extract: 响应中推荐链接的提取规则
//! - storage: 本地键值存储
//! - clipboard: 剪贴板
//! - provisioner: 推荐链接状态机

pub mod api;
pub mod clipboard;
pub mod context;
pub mod error;
pub mod extract;
pub mod model;
pub mod provisioner;
pub mod storage;

pub use api::{DynReferralApi, HttpReferralApi, ReferralApi};
pub use clipboard::{Clipboard, CommandClipboard, DynClipboard, MemoryClipboard};
pub use context::{OrderContext, SessionContext};
pub use error::{ErrorKind, ReferralError, Result};
pub use extract::{extract_link, LinkField};
pub use model::{ReferralRequest, ReferralResult, ReferralStatus, ReferralView};
pub use provisioner::{ProvisionerSettings, ReferralProvisioner};
pub use storage::{keys, DynKeyValueStore, FileStore, KeyValueStore, MemoryStore};
