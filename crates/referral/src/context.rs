use crate::storage::{keys, KeyValueStore};
use serde_json::Value;
use tracing::{debug, warn};
use utils::AppResult;

/// 当前会话的身份信息，只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub auth_token: Option<String>,
    pub user_email: Option<String>,
}

impl SessionContext {
    pub fn new(auth_token: Option<String>, user_email: Option<String>) -> Self {
        Self {
            auth_token: non_empty(auth_token),
            user_email: non_empty(user_email),
        }
    }

    /// 从本地存储读取 `authToken` 和 `userData.email`
    pub async fn from_store(store: &(dyn KeyValueStore + Send + Sync)) -> AppResult<Self> {
        let auth_token = store.get(keys::AUTH_TOKEN).await?;

        let user_email = match store.get(keys::USER_DATA).await? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(profile) => profile.get("email").and_then(Value::as_str).map(str::to_string),
                Err(e) => {
                    warn!("⚠️ userData 不是合法JSON，视为没有用户信息: {}", e);
                    None
                }
            },
            None => None,
        };

        debug!(
            has_token = auth_token.is_some(),
            has_email = user_email.is_some(),
            "🔍 从存储读取会话信息"
        );

        Ok(Self::new(auth_token, user_email))
    }
}

/// 刚完成的订单信息，只用于选择推荐的商家
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderContext {
    pub vendor_id: Option<String>,
    pub item_vendor_ids: Vec<String>,
}

impl OrderContext {
    pub fn new(vendor_id: Option<String>, item_vendor_ids: Vec<String>) -> Self {
        Self {
            vendor_id: non_empty(vendor_id),
            item_vendor_ids,
        }
    }

    /// 从订单快照中读取商家信息，兼容 `artisanId` / `vendorId` 两种字段名
    pub fn from_order_json(order: &Value) -> Self {
        let vendor_id = vendor_field(order);
        let item_vendor_ids = order
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(vendor_field).collect())
            .unwrap_or_default();

        Self::new(vendor_id, item_vendor_ids)
    }

    /// 优先使用页面跳转时带过来的订单，其次是存储中的 `lastOrder`
    pub async fn resolve(
        navigation: Option<&Value>,
        store: &(dyn KeyValueStore + Send + Sync),
    ) -> AppResult<Self> {
        if let Some(order) = navigation {
            return Ok(Self::from_order_json(order));
        }

        match store.get(keys::LAST_ORDER).await? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(order) => Ok(Self::from_order_json(&order)),
                Err(e) => {
                    warn!("⚠️ lastOrder 不是合法JSON，忽略: {}", e);
                    Ok(Self::default())
                }
            },
            None => Ok(Self::default()),
        }
    }

    /// vendor_id -> 第一个商品的商家 -> 默认商家
    pub fn resolve_vendor_id(&self, default_vendor_id: &str) -> String {
        if let Some(id) = self.vendor_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return id.to_string();
        }

        if let Some(id) = self.item_vendor_ids.iter().find(|id| !id.trim().is_empty()) {
            return id.clone();
        }

        debug!(default_vendor_id, "📦 订单中没有商家信息，使用默认商家");
        default_vendor_id.to_string()
    }
}

fn vendor_field(value: &Value) -> Option<String> {
    ["artisanId", "vendorId"]
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .find(|id| !id.trim().is_empty())
        .map(str::to_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    const DEFAULT_VENDOR: &str = "68625f709729ffdfa0f7242d";

    #[test]
    fn test_vendor_precedence() {
        let order = OrderContext::new(Some("v-order".into()), vec!["v-item".into()]);
        assert_eq!(order.resolve_vendor_id(DEFAULT_VENDOR), "v-order");

        let order = OrderContext::new(None, vec!["".into(), "v-item".into()]);
        assert_eq!(order.resolve_vendor_id(DEFAULT_VENDOR), "v-item");

        let order = OrderContext::default();
        assert_eq!(order.resolve_vendor_id(DEFAULT_VENDOR), DEFAULT_VENDOR);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let session = SessionContext::new(Some("".into()), Some("  ".into()));
        assert_eq!(session, SessionContext::default());

        let order = OrderContext::new(Some("".into()), vec![]);
        assert_eq!(order.resolve_vendor_id(DEFAULT_VENDOR), DEFAULT_VENDOR);
    }

    #[test]
    fn test_from_order_json() {
        let order = OrderContext::from_order_json(&json!({
            "total": 120,
            "items": [
                { "name": "vase", "artisanId": "a-1" },
                { "name": "rug" },
                { "name": "bowl", "vendorId": "v-3" }
            ]
        }));

        assert_eq!(order.vendor_id, None);
        assert_eq!(order.item_vendor_ids, vec!["a-1".to_string(), "v-3".to_string()]);
        assert_eq!(order.resolve_vendor_id(DEFAULT_VENDOR), "a-1");
    }

    #[tokio::test]
    async fn test_session_from_store() {
        let store = MemoryStore::with_entries([
            (keys::AUTH_TOKEN, "tok"),
            (keys::USER_DATA, r#"{"email":"buyer@example.com","name":"Buyer"}"#),
        ]);

        let session = SessionContext::from_store(&store).await.unwrap();
        assert_eq!(session.auth_token.as_deref(), Some("tok"));
        assert_eq!(session.user_email.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_session_with_corrupt_profile() {
        let store = MemoryStore::with_entries([(keys::AUTH_TOKEN, "tok"), (keys::USER_DATA, "{oops")]);

        let session = SessionContext::from_store(&store).await.unwrap();
        assert_eq!(session.auth_token.as_deref(), Some("tok"));
        assert_eq!(session.user_email, None);
    }

    #[tokio::test]
    async fn test_order_resolution_prefers_navigation_state() {
        let store = MemoryStore::with_entries([(keys::LAST_ORDER, r#"{"artisanId":"stored"}"#)]);

        let nav = json!({ "artisanId": "nav" });
        let order = OrderContext::resolve(Some(&nav), &store).await.unwrap();
        assert_eq!(order.vendor_id.as_deref(), Some("nav"));

        let order = OrderContext::resolve(None, &store).await.unwrap();
        assert_eq!(order.vendor_id.as_deref(), Some("stored"));

        let empty = MemoryStore::new();
        let order = OrderContext::resolve(None, &empty).await.unwrap();
        assert_eq!(order, OrderContext::default());
    }
}
