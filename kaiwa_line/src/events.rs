//! Typed webhook events.
//!
//! The platform delivers a batch of events per request; only text
//! messages, follows, and unfollows are meaningful here. Unknown event
//! and message kinds deserialize into catch-all variants so one exotic
//! event cannot fail the whole batch.

use serde::Deserialize;

/// Top-level webhook request body.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Message(MessageEvent),
    Follow(FollowEvent),
    Unfollow(UnfollowEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub reply_token: String,
    pub source: EventSource,
    pub message: MessageContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEvent {
    pub reply_token: String,
    pub source: EventSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowEvent {
    pub source: EventSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text(TextMessageContent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TextMessageContent {
    #[serde(default)]
    pub id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn text_message_event_parses() {
        let body = r#"{
            "destination": "U_bot",
            "events": [{
                "type": "message",
                "replyToken": "rt-123",
                "source": { "type": "user", "userId": "U_abc" },
                "message": { "type": "text", "id": "m-1", "text": "こんにちは" }
            }]
        }"#;

        let payload: WebhookPayload =
            serde_json::from_str(body).expect("Failed to parse webhook payload");
        assert_eq!(payload.events.len(), 1);

        let Event::Message(event) = &payload.events[0] else {
            panic!("expected a message event");
        };
        assert_eq!(event.reply_token, "rt-123");
        assert_eq!(event.source.user_id, "U_abc");
        let MessageContent::Text(text) = &event.message else {
            panic!("expected a text message");
        };
        assert_eq!(text.text, "こんにちは");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn follow_and_unfollow_parse() {
        let body = r#"{
            "events": [
                { "type": "follow", "replyToken": "rt-f", "source": { "userId": "U1" } },
                { "type": "unfollow", "source": { "userId": "U1" } }
            ]
        }"#;

        let payload: WebhookPayload =
            serde_json::from_str(body).expect("Failed to parse webhook payload");
        assert!(matches!(payload.events[0], Event::Follow(_)));
        assert!(matches!(payload.events[1], Event::Unfollow(_)));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn unknown_event_kind_becomes_other() {
        let body = r#"{ "events": [ { "type": "beacon", "hwid": "xx" } ] }"#;

        let payload: WebhookPayload =
            serde_json::from_str(body).expect("Failed to parse webhook payload");
        assert!(matches!(payload.events[0], Event::Other));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn non_text_message_content_becomes_other() {
        let body = r#"{
            "events": [{
                "type": "message",
                "replyToken": "rt-1",
                "source": { "userId": "U1" },
                "message": { "type": "sticker", "packageId": "1", "stickerId": "2" }
            }]
        }"#;

        let payload: WebhookPayload =
            serde_json::from_str(body).expect("Failed to parse webhook payload");
        let Event::Message(event) = &payload.events[0] else {
            panic!("expected a message event");
        };
        assert!(matches!(event.message, MessageContent::Other));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn empty_events_batch_parses() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{ "destination": "U_bot", "events": [] }"#)
                .expect("Failed to parse webhook payload");
        assert!(payload.events.is_empty());
    }
}
