use crate::{
    api::DynReferralApi,
    clipboard::DynClipboard,
    context::{OrderContext, SessionContext},
    error::{ReferralError, Result},
    extract::extract_link,
    model::{ReferralRequest, ReferralResult, ReferralView},
    storage::{keys, DynKeyValueStore},
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use utils::AppConfig;

/// 状态机需要的配置
#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    /// 订单里没有商家时使用的默认商家
    pub default_vendor_id: String,
    /// 复制成功后 `copied` 复位的延迟
    pub copied_reset: Duration,
    /// 是否允许在 Ready 状态下 retry
    pub allow_refresh_from_ready: bool,
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            default_vendor_id: "68625f709729ffdfa0f7242d".to_string(),
            copied_reset: Duration::from_millis(2000),
            allow_refresh_from_ready: false,
        }
    }
}

impl From<&AppConfig> for ProvisionerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_vendor_id: config.default_vendor_id.clone(),
            copied_reset: Duration::from_millis(config.copied_reset_ms),
            allow_refresh_from_ready: config.allow_refresh_from_ready,
        }
    }
}

struct Inner {
    api: DynReferralApi,
    store: DynKeyValueStore,
    clipboard: DynClipboard,
    settings: ProvisionerSettings,

    result: Mutex<ReferralResult>,
    context: Mutex<Option<(SessionContext, OrderContext)>>,

    // 同一时间只允许一个生成请求
    in_flight: AtomicBool,
    // 每次被接受的生成尝试 +1，shutdown 时也 +1 使在途结果作废
    attempt: AtomicU64,
    torn_down: AtomicBool,

    copied: AtomicBool,
    copy_seq: AtomicU64,
    copied_timer: Mutex<Option<JoinHandle<()>>>,

    view_tx: watch::Sender<ReferralView>,
}

impl Inner {
    fn publish_locked(&self, result: &ReferralResult) {
        let view = ReferralView::from_parts(
            result,
            self.copied.load(Ordering::SeqCst),
            self.in_flight.load(Ordering::SeqCst),
        );
        self.view_tx.send_replace(view);
    }

    async fn publish(&self) {
        let result = self.result.lock().await;
        self.publish_locked(&result);
    }
}

/// 推荐链接生成器
///
/// 负责:
/// - 校验会话前置条件并选择商家
/// - 调用远程推荐服务并解析链接
/// - 把链接写入本地存储以便下次复用
/// - 维护 Pending / Ready / Failed 状态并推送给展示层
/// - 复制链接并在延迟后复位 `copied`
///
/// 在途请求期间再次调用 `generate` 会被直接忽略，不会排队。
pub struct ReferralProvisioner {
    inner: Arc<Inner>,
}

impl ReferralProvisioner {
    pub fn new(
        api: DynReferralApi,
        store: DynKeyValueStore,
        clipboard: DynClipboard,
        settings: ProvisionerSettings,
    ) -> Self {
        let (view_tx, _) = watch::channel(ReferralView::default());

        Self {
            inner: Arc::new(Inner {
                api,
                store,
                clipboard,
                settings,
                result: Mutex::new(ReferralResult::Pending),
                context: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                attempt: AtomicU64::new(0),
                torn_down: AtomicBool::new(false),
                copied: AtomicBool::new(false),
                copy_seq: AtomicU64::new(0),
                copied_timer: Mutex::new(None),
                view_tx,
            }),
        }
    }

    pub async fn result(&self) -> ReferralResult {
        self.inner.result.lock().await.clone()
    }

    pub fn view(&self) -> ReferralView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReferralView> {
        self.inner.view_tx.subscribe()
    }

    pub fn is_generating(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_copied(&self) -> bool {
        self.inner.copied.load(Ordering::SeqCst)
    }

    /// 为当前会话/订单生成推荐链接
    ///
    /// 已有请求在途时直接返回当前状态（Pending），不会再次调用远程服务。
    pub async fn generate(&self, session: SessionContext, order: OrderContext) -> ReferralResult {
        if self.inner.torn_down.load(Ordering::SeqCst) {
            warn!("⚠️ 生成器已关闭，忽略 generate 调用");
            return self.result().await;
        }

        if !self.try_begin() {
            warn!("⚠️ 已有推荐链接请求在进行中，忽略本次 generate 调用");
            return self.result().await;
        }

        *self.inner.context.lock().await = Some((session.clone(), order.clone()));

        self.run_attempt(session, order).await
    }

    /// 用上一次的上下文重新生成
    ///
    /// 返回 `None` 表示请求被拒绝：还没有生成过、请求在途、或 Ready 状态下未开启刷新。
    pub async fn retry(&self) -> Option<ReferralResult> {
        if self.inner.torn_down.load(Ordering::SeqCst) {
            warn!("⚠️ 生成器已关闭，忽略 retry 调用");
            return None;
        }

        match self.result().await {
            ReferralResult::Failed { .. } => {}
            ReferralResult::Ready { .. } if self.inner.settings.allow_refresh_from_ready => {}
            current => {
                warn!(status = ?current.status(), "⚠️ 当前状态不允许 retry");
                return None;
            }
        }

        let context = self.inner.context.lock().await.clone();
        let Some((session, order)) = context else {
            warn!("⚠️ 没有可重试的上下文");
            return None;
        };

        if !self.try_begin() {
            warn!("⚠️ 已有推荐链接请求在进行中，忽略本次 retry 调用");
            return None;
        }

        info!("🔄 重新生成推荐链接");
        Some(self.run_attempt(session, order).await)
    }

    /// 复制推荐链接到剪贴板
    pub async fn copy_link(&self) -> bool {
        if self.inner.torn_down.load(Ordering::SeqCst) {
            return false;
        }

        let link = match self.result().await {
            ReferralResult::Ready { link } => link,
            current => {
                warn!(status = ?current.status(), "⚠️ 还没有可复制的推荐链接");
                return false;
            }
        };

        let outcome = self.inner.clipboard.write_text(&link).await;

        // 持有定时器锁直到新的定时器就位，序号与定时器一一对应
        let mut timer = self.inner.copied_timer.lock().await;
        let seq = self.inner.copy_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        match outcome {
            Ok(()) => {
                self.inner.copied.store(true, Ordering::SeqCst);
                self.inner.publish().await;
                *timer = Some(self.spawn_copied_reset(seq));

                info!("📋 推荐链接已复制到剪贴板");
                true
            }
            Err(e) => {
                error!(reason = ?e.kind(), "❌ 复制推荐链接失败: {}", e);
                self.inner.copied.store(false, Ordering::SeqCst);
                self.inner.publish().await;
                false
            }
        }
    }

    /// 页面卸载：作废在途请求的结果并取消复位定时器
    pub async fn shutdown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.attempt.fetch_add(1, Ordering::SeqCst);
        self.cancel_copied_timer().await;
        debug!("🛑 推荐链接生成器已关闭");
    }

    fn try_begin(&self) -> bool {
        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn run_attempt(&self, session: SessionContext, order: OrderContext) -> ReferralResult {
        let attempt = self.inner.attempt.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut result = self.inner.result.lock().await;
            *result = ReferralResult::Pending;
            self.inner.publish_locked(&result);
        }

        let outcome = match self.provision(attempt, &session, &order).await {
            Ok(link) => {
                info!(attempt, "✅ 推荐链接生成成功: {}", link);
                ReferralResult::Ready { link }
            }
            Err(e) => {
                error!(attempt, reason = ?e.kind(), "❌ 推荐链接生成失败: {}", e);
                ReferralResult::failed(&e)
            }
        };

        let mut result = self.inner.result.lock().await;
        let current_attempt = self.inner.attempt.load(Ordering::SeqCst);
        if self.inner.torn_down.load(Ordering::SeqCst) || current_attempt != attempt {
            warn!(attempt, current_attempt, "⚠️ 生成结果已过期，丢弃");
            self.inner.in_flight.store(false, Ordering::SeqCst);
            self.inner.publish_locked(&result);
            return outcome;
        }

        *result = outcome.clone();
        self.inner.in_flight.store(false, Ordering::SeqCst);
        self.inner.publish_locked(&result);

        outcome
    }

    async fn provision(&self, attempt: u64, session: &SessionContext, order: &OrderContext) -> Result<String> {
        let token = session
            .auth_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ReferralError::Unauthenticated)?;

        let email = session
            .user_email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(ReferralError::MissingProfile)?;

        let vendor_id = order.resolve_vendor_id(&self.inner.settings.default_vendor_id);
        debug!(attempt, vendor_id = %vendor_id, "📦 选定推荐商家");

        let request = ReferralRequest::new(email, vendor_id)
            .ok_or_else(|| ReferralError::Service("商家ID为空，无法创建推荐链接".to_string()))?;

        let body = self.inner.api.create_referral_link(token, &request).await?;

        let link = extract_link(&body).ok_or_else(|| {
            error!(attempt, "❌ 推荐服务响应中没有链接: {}", body);
            ReferralError::MalformedResponse(body.to_string())
        })?;

        self.persist(&link).await;

        Ok(link)
    }

    /// 写入失败不影响生成结果
    async fn persist(&self, link: &str) {
        for key in [keys::REFERRAL_CODE, keys::REFERRAL_LINK] {
            if let Err(e) = self.inner.store.set(key, link).await {
                warn!(key, "⚠️ 推荐链接写入本地存储失败: {}", e);
            }
        }
    }

    fn spawn_copied_reset(&self, seq: u64) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let deadline = tokio::time::Instant::now() + self.inner.settings.copied_reset;

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let _timer = inner.copied_timer.lock().await;
            if inner.copy_seq.load(Ordering::SeqCst) != seq || inner.torn_down.load(Ordering::SeqCst) {
                return;
            }
            inner.copied.store(false, Ordering::SeqCst);
            inner.publish().await;
        })
    }

    async fn cancel_copied_timer(&self) {
        if let Some(handle) = self.inner.copied_timer.lock().await.take() {
            handle.abort();
        }
    }
}

impl Drop for ReferralProvisioner {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.inner.copied_timer.try_lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}
