// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Push → notification → click routing.
//!
//! Push payloads are decoded leniently: a missing body, invalid JSON, a
//! non-object document or a field of the wrong type all fall back to the
//! configured [`NotificationDefaults`] instead of failing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::NotificationDefaults;
use crate::error::EngineError;
use crate::host::{ClientHost, NotificationHost};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Decoded push payload. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub target_url: Option<String>,
    /// `None` when the payload carried no `actions` array
    pub actions: Option<Vec<NotificationAction>>,
}

impl PushPayload {
    /// Decode raw push data. Absent or malformed data yields an empty payload.
    #[must_use]
    pub fn parse(data: Option<&[u8]>) -> Self {
        let Some(bytes) = data else {
            return Self::default();
        };
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                debug!(error = %e, "Push payload is not JSON, using defaults");
                Self::default()
            }
        }
    }

    /// Extract known fields from a JSON value, skipping any of the wrong type.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let text = |field: &str| obj.get(field).and_then(Value::as_str).map(str::to_string);
        let actions = obj.get("actions").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|item| NotificationAction::deserialize(item).ok())
                .collect()
        });
        Self {
            title: text("title"),
            body: text("body"),
            target_url: text("url"),
            actions,
        }
    }
}

/// Extra data carried by a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationData {
    pub target_url: Option<String>,
}

/// A notification as handed to the [`NotificationHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

pub struct NotificationDispatcher {
    defaults: NotificationDefaults,
    notifications: Arc<dyn NotificationHost>,
    clients: Arc<dyn ClientHost>,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(
        defaults: NotificationDefaults,
        notifications: Arc<dyn NotificationHost>,
        clients: Arc<dyn ClientHost>,
    ) -> Self {
        Self {
            defaults,
            notifications,
            clients,
        }
    }

    /// Build the notification for a payload, filling gaps from defaults.
    #[must_use]
    pub fn build(&self, payload: PushPayload) -> Notification {
        let defaults = &self.defaults;
        let actions = payload.actions.unwrap_or_else(|| {
            vec![NotificationAction {
                action: defaults.action.clone(),
                title: defaults.action_title.clone(),
            }]
        });
        let or_default = |value: Option<String>, fallback: &String| {
            value.filter(|v| !v.is_empty()).unwrap_or_else(|| fallback.clone())
        };
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title: or_default(payload.title, &defaults.title),
            body: or_default(payload.body, &defaults.body),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            actions,
            data: NotificationData {
                target_url: Some(or_default(payload.target_url, &defaults.target_url)),
            },
        }
    }

    /// Handle a push event: decode, build, display.
    #[tracing::instrument(skip(self, data), fields(has_data = data.is_some()))]
    pub async fn on_push(&self, data: Option<&[u8]>) -> Result<Notification, EngineError> {
        let payload = PushPayload::parse(data);
        let notification = self.build(payload);

        if let Err(e) = self.notifications.show_notification(&notification).await {
            warn!(error = %e, "Failed to display push notification");
            return Err(e.into());
        }
        crate::metrics::record_push();
        info!(id = %notification.id, title = %notification.title, "Displayed push notification");
        Ok(notification)
    }

    /// Handle a click: close the notification, then open its target.
    /// Returns the url that was opened.
    #[tracing::instrument(skip(self, notification), fields(id = %notification.id))]
    pub async fn on_notification_click(&self, notification: &Notification) -> Result<String, EngineError> {
        if let Err(e) = self.notifications.close_notification(&notification.id).await {
            warn!(error = %e, "Failed to close notification");
        }

        let url = notification
            .data
            .target_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "/".to_string());

        if let Err(e) = self.clients.open_window(&url).await {
            warn!(url = %url, error = %e, "Failed to open window for notification click");
            return Err(e.into());
        }
        crate::metrics::record_notification_click();
        info!(url = %url, "Opened window for notification click");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    fn dispatcher(host: &Arc<InMemoryHost>) -> NotificationDispatcher {
        let defaults = NotificationDefaults {
            title: "Sports Central".into(),
            body: "New update".into(),
            icon: Some("/icons/icon-192x192.png".into()),
            badge: Some("/icons/icon-72x72.png".into()),
            ..Default::default()
        };
        NotificationDispatcher::new(defaults, host.clone(), host.clone())
    }

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"{"title":"Goal!","body":"2-1","url":"/match/7","actions":[{"action":"view","title":"View"}]}"#.as_bytes();
        let payload = PushPayload::parse(Some(raw));
        assert_eq!(payload.title.as_deref(), Some("Goal!"));
        assert_eq!(payload.body.as_deref(), Some("2-1"));
        assert_eq!(payload.target_url.as_deref(), Some("/match/7"));
        assert_eq!(payload.actions.unwrap()[0].action, "view");
    }

    #[test]
    fn test_parse_absent_and_malformed() {
        assert_eq!(PushPayload::parse(None), PushPayload::default());
        assert_eq!(PushPayload::parse(Some("{oops".as_bytes())), PushPayload::default());
        assert_eq!(PushPayload::parse(Some("[1,2]".as_bytes())), PushPayload::default());
        assert_eq!(PushPayload::parse(Some("".as_bytes())), PushPayload::default());
    }

    #[test]
    fn test_parse_skips_wrongly_typed_fields() {
        let raw = r#"{"title": 42, "body": "ok", "actions": [{"action": "a"}, {"action": "b", "title": "B"}]}"#.as_bytes();
        let payload = PushPayload::parse(Some(raw));
        assert_eq!(payload.title, None);
        assert_eq!(payload.body.as_deref(), Some("ok"));
        assert_eq!(payload.actions.unwrap(), vec![NotificationAction { action: "b".into(), title: "B".into() }]);
    }

    #[test]
    fn test_build_fills_defaults() {
        let host = Arc::new(InMemoryHost::new());
        let n = dispatcher(&host).build(PushPayload::default());
        assert_eq!(n.title, "Sports Central");
        assert_eq!(n.body, "New update");
        assert_eq!(n.icon.as_deref(), Some("/icons/icon-192x192.png"));
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.actions, vec![NotificationAction { action: "open".into(), title: "Open App".into() }]);
        assert_eq!(n.data.target_url.as_deref(), Some("/"));
    }

    #[test]
    fn test_build_treats_empty_strings_as_missing() {
        let host = Arc::new(InMemoryHost::new());
        let payload = PushPayload::parse(Some(r#"{"title":"","url":""}"#.as_bytes()));
        let n = dispatcher(&host).build(payload);
        assert_eq!(n.title, "Sports Central");
        assert_eq!(n.data.target_url.as_deref(), Some("/"));
    }

    #[test]
    fn test_build_keeps_explicit_empty_actions() {
        let host = Arc::new(InMemoryHost::new());
        let payload = PushPayload { actions: Some(vec![]), ..Default::default() };
        assert!(dispatcher(&host).build(payload).actions.is_empty());
    }

    #[tokio::test]
    async fn test_on_push_displays() {
        let host = Arc::new(InMemoryHost::new());
        let n = dispatcher(&host).on_push(Some(r#"{"title":"Kickoff"}"#.as_bytes())).await.unwrap();
        let shown = host.shown_notifications();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0], n);
        assert_eq!(shown[0].title, "Kickoff");
    }

    #[tokio::test]
    async fn test_on_push_without_data_still_displays() {
        let host = Arc::new(InMemoryHost::new());
        dispatcher(&host).on_push(None).await.unwrap();
        assert_eq!(host.shown_notifications()[0].title, "Sports Central");
    }

    #[tokio::test]
    async fn test_click_closes_and_opens_target() {
        let host = Arc::new(InMemoryHost::new());
        let d = dispatcher(&host);
        let n = d.on_push(Some(r#"{"url":"/match/7"}"#.as_bytes())).await.unwrap();

        let opened = d.on_notification_click(&n).await.unwrap();
        assert_eq!(opened, "/match/7");
        assert_eq!(host.closed_notifications(), vec![n.id.clone()]);
        assert_eq!(host.opened_windows(), vec!["/match/7"]);
    }

    #[tokio::test]
    async fn test_click_without_target_opens_root() {
        let host = Arc::new(InMemoryHost::new());
        let mut n = dispatcher(&host).build(PushPayload::default());
        n.data.target_url = None;

        let opened = dispatcher(&host).on_notification_click(&n).await.unwrap();
        assert_eq!(opened, "/");
    }
}
