use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// A webhook registered on an organization.
///
/// Every field is optional so the same type can be sent as a create or
/// partial edit payload and received back from the server. Unset fields are
/// left out of the request body.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    pub id: Option<i64>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub events: Option<Vec<String>>,
    pub active: Option<bool>,
    pub config: Option<Map<String, Value>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Pagination parameters appended to list requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListOptions {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_not_serialized() {
        let hook = Hook::new("web").with_config("url", "https://example.com/hook");

        let body = serde_json::to_value(&hook).unwrap();

        assert_eq!(
            body,
            json!({ "name": "web", "config": { "url": "https://example.com/hook" } })
        );
    }

    #[test]
    fn deserializes_server_hook() {
        let hook: Hook = serde_json::from_value(json!({
            "id": 12345678,
            "url": "https://api.github.com/orgs/octocat/hooks/12345678",
            "name": "web",
            "events": ["push", "pull_request"],
            "active": true,
            "config": { "url": "http://example.com", "content_type": "json" },
            "updated_at": "2011-09-06T20:39:23Z",
            "created_at": "2011-09-06T17:26:27Z",
            "type": "Organization"
        }))
        .unwrap();

        assert_eq!(hook.id, Some(12345678));
        assert_eq!(hook.events.as_deref(), Some(&["push".to_string(), "pull_request".to_string()][..]));
        assert_eq!(hook.config.unwrap()["content_type"], "json");
        assert_eq!(hook.created_at.unwrap().to_rfc3339(), "2011-09-06T17:26:27+00:00");
    }

    #[test]
    fn list_options_only_emit_set_fields() {
        assert!(ListOptions::default().query_pairs().is_empty());
        assert_eq!(
            ListOptions::page(2).with_per_page(50).query_pairs(),
            vec![("page", "2".to_string()), ("per_page", "50".to_string())]
        );
    }
}
