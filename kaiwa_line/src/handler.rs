use tracing::{debug, error, info};

use crate::events::{Event, FollowEvent, MessageContent, MessageEvent, UnfollowEvent};
use crate::server::AppState;

/// Route one verified webhook event.
///
/// Exactly one reply is sent per message or follow event; a failed send
/// is logged and dropped, never retried.
pub async fn handle_event(state: &AppState, event: Event) {
    match event {
        Event::Message(e) => handle_message(state, e).await,
        Event::Follow(e) => handle_follow(state, e).await,
        Event::Unfollow(e) => handle_unfollow(&e),
        Event::Other => debug!("Ignoring unsupported event kind"),
    }
}

async fn handle_message(state: &AppState, event: MessageEvent) {
    let MessageContent::Text(text) = event.message else {
        debug!("Ignoring non-text message");
        return;
    };

    let user_id = event.source.user_id;
    info!(user_id, "Message received");

    let reply = state.engine().handle_message(&user_id, &text.text).await;

    if let Err(e) = state.line().reply_text(&event.reply_token, &reply).await {
        error!(user_id, "Error sending reply: {e}");
    }
}

async fn handle_follow(state: &AppState, event: FollowEvent) {
    let user_id = event.source.user_id;
    info!(user_id, "User followed");

    let welcome = format!(
        "初めまして！\nGPTくんです！\n\n会話を記憶するけど、「{}」と入力すると会話履歴をリセットするよ！",
        state.reset_keyword()
    );

    if let Err(e) = state.line().reply_text(&event.reply_token, &welcome).await {
        error!(user_id, "Error sending welcome message: {e}");
    }
}

fn handle_unfollow(event: &UnfollowEvent) {
    info!(user_id = event.source.user_id, "User unfollowed");
}
