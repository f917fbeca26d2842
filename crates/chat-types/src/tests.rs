#[cfg(test)]
mod tests {
    use crate::message::*;
    use crate::event::*;
    use crate::config::*;
    use crate::session::*;
    use crate::error::*;
    use chrono::{Duration, TimeZone, Utc};

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_message_decodes_table_row() {
        let json = r#"{
            "id": 7,
            "content": "hello",
            "is_ai": false,
            "created_at": "2026-03-01T10:00:00.123456+00:00",
            "image_url": null,
            "user_id": "u-1",
            "conversation_id": null,
            "title": null
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, 7);
        assert_eq!(msg.content, "hello");
        assert!(!msg.is_ai);
        assert_eq!(msg.user_id, "u-1");
        assert!(msg.image_url.is_none());
        assert!(msg.title.is_none());
    }

    #[test]
    fn test_message_decodes_without_optional_columns() {
        let json = r#"{"id":1,"content":"hi","is_ai":true,"created_at":"2026-03-01T10:00:00Z","user_id":"u"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(msg.is_ai);
        assert_eq!(msg.author_label(), "AI");
        assert!(msg.conversation_id.is_none());
    }

    #[test]
    fn test_new_message_omits_absent_fields() {
        let msg = NewMessage::user("u-1", "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["is_ai"], false);
        assert_eq!(json["user_id"], "u-1");
        assert!(json.get("image_url").is_none());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_new_message_ai_with_image() {
        let msg = NewMessage::ai("u-1", "reply").with_image(Some("https://img/x.png".to_string()));
        assert!(msg.is_ai);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["image_url"], "https://img/x.png");
    }

    #[test]
    fn test_into_row_keeps_payload() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let row = NewMessage::user("u", "x").into_row(42, at);
        assert_eq!(row.id, 42);
        assert_eq!(row.created_at, at);
        assert_eq!(row.author_label(), "You");
    }

    #[test]
    fn test_sort_key_breaks_ties_by_id() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let a = NewMessage::user("u", "a").into_row(2, at);
        let b = NewMessage::user("u", "b").into_row(1, at);
        assert!(b.sort_key() < a.sort_key());
    }

    // ─── Session Tests ───────────────────────────────────────

    fn session(expires_at: Option<chrono::DateTime<Utc>>) -> AuthSession {
        AuthSession {
            access_token: "tok".to_string(),
            refresh_token: "ref".to_string(),
            token_type: "bearer".to_string(),
            expires_at,
            user: AuthUser { id: "u-1".to_string(), email: Some("a@b.c".to_string()) },
        }
    }

    #[test]
    fn test_session_bearer() {
        let s = session(None);
        assert_eq!(bearer(&s.access_token), "Bearer tok");
        assert_eq!(s.user_id(), "u-1");
    }

    #[test]
    fn test_session_expiry_margin() {
        let now = Utc::now();
        assert!(!session(None).is_expired(now));
        assert!(!session(Some(now + Duration::hours(1))).is_expired(now));
        assert!(session(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(session(Some(now - Duration::seconds(1))).is_expired(now));
    }

    #[test]
    fn test_session_token_type_defaults() {
        let json = r#"{"access_token":"a","refresh_token":"r","user":{"id":"u"}}"#;
        let s: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(s.token_type, "bearer");
        assert!(s.user.email.is_none());
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_toast_constructors() {
        let ok = Toast::success("Chat history cleared");
        assert_eq!(ok.title, "Success");
        assert!(!ok.is_destructive());

        let err = Toast::error("Failed to save message");
        assert_eq!(err.title, "Error");
        assert_eq!(err.variant, ToastVariant::Destructive);
    }

    #[test]
    fn test_chat_event_serialization() {
        let event = ChatEvent::Toast(Toast::error("boom"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Toast"));
        assert!(json.contains("boom"));
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.generate_function, "generate-text");
        assert_eq!(config.messages_table, "messages");
        assert!(!config.require_api_key);
    }

    #[test]
    fn test_config_urls() {
        let config = ChatConfig::new("https://abc.supabase.co/", "anon");
        assert!(config.is_configured());
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1/messages");
        assert_eq!(config.auth_url("/token"), "https://abc.supabase.co/auth/v1/token");
        assert_eq!(config.function_url(), "https://abc.supabase.co/functions/v1/generate-text");
        assert_eq!(
            config.realtime_url(),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
    }

    #[test]
    fn test_realtime_url_plain_http() {
        let config = ChatConfig::new("http://localhost:54321", "k");
        assert!(config.realtime_url().starts_with("ws://localhost:54321/realtime/v1/websocket"));
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_server_error_prefers_body_message() {
        let err = ChatError::server(429, Some("Quota exceeded".to_string()));
        assert_eq!(err.to_string(), "Server error (429): Quota exceeded");
    }

    #[test]
    fn test_server_error_generic_message_has_status() {
        let err = ChatError::server(500, None);
        assert!(err.to_string().contains("500"));
        let err = ChatError::server(502, Some("  ".to_string()));
        assert_eq!(err.to_string(), "Server error (502): Request failed with status 502");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ChatError::no_response().to_string(), "No response generated");
        assert_eq!(
            ChatError::not_signed_in().to_string(),
            "Authentication error: Not authenticated"
        );
        assert_eq!(
            ChatError::Storage("denied".to_string()).to_string(),
            "Storage error: denied"
        );
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{invalid}}").unwrap_err();
        let err: ChatError = serde_err.into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }
}
