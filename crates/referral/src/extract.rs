use serde_json::Value;

/// 推荐服务响应中可能携带链接的字段，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    ReferralLink,
    Link,
    Url,
}

impl LinkField {
    pub const ORDERED: [LinkField; 3] = [LinkField::ReferralLink, LinkField::Link, LinkField::Url];

    pub fn key(self) -> &'static str {
        match self {
            LinkField::ReferralLink => "referralLink",
            LinkField::Link => "link",
            LinkField::Url => "url",
        }
    }

    fn extract(self, body: &Value) -> Option<String> {
        body.get(self.key())
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

/// 返回第一个非空的链接字段
///
/// 顶层没有命中时，再到 `data` 对象里找一遍。
pub fn extract_link(body: &Value) -> Option<String> {
    first_match(body).or_else(|| body.get("data").and_then(first_match))
}

fn first_match(body: &Value) -> Option<String> {
    LinkField::ORDERED.iter().find_map(|field| field.extract(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_priority() {
        let body = json!({ "url": "u", "link": "l", "referralLink": "r" });
        assert_eq!(extract_link(&body).as_deref(), Some("r"));

        let body = json!({ "url": "u", "link": "l" });
        assert_eq!(extract_link(&body).as_deref(), Some("l"));

        let body = json!({ "url": "u" });
        assert_eq!(extract_link(&body).as_deref(), Some("u"));
    }

    #[test]
    fn test_empty_and_non_string_fields_are_skipped() {
        let body = json!({ "referralLink": "", "link": 42, "url": "https://x/r/abc" });
        assert_eq!(extract_link(&body).as_deref(), Some("https://x/r/abc"));

        let body = json!({ "referralLink": "   ", "link": null });
        assert_eq!(extract_link(&body), None);
    }

    #[test]
    fn test_link_returned_verbatim() {
        let body = json!({ "link": "  https://x/r/abc\n" });
        assert_eq!(extract_link(&body).as_deref(), Some("  https://x/r/abc\n"));
    }

    #[test]
    fn test_no_known_field() {
        assert_eq!(extract_link(&json!({})), None);
        assert_eq!(extract_link(&json!({ "code": "abc" })), None);
        assert_eq!(extract_link(&json!("https://x/r/abc")), None);
    }

    #[test]
    fn test_nested_data_payload() {
        let body = json!({ "success": true, "data": { "link": "https://x/r/nested" } });
        assert_eq!(extract_link(&body).as_deref(), Some("https://x/r/nested"));

        let body = json!({ "link": "https://x/r/top", "data": { "link": "https://x/r/nested" } });
        assert_eq!(extract_link(&body).as_deref(), Some("https://x/r/top"));
    }
}
