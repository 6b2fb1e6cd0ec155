use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{debug, info};

use himo_db::time;
use himo_types::api::{
    ChatListResponse, ChatMessage, ChatSummary, MessageListResponse, SendMessageRequest,
    SendMessageResponse,
};

use crate::error::ApiError;
use crate::request::{parse_body, query_id};
use crate::response;
use crate::state::{AppState, with_store};

/// Cap on messages returned by one `messages` read.
pub const MESSAGE_PAGE_LIMIT: u32 = 100;

/// Shown as the last message of a chat nobody has written in yet.
pub const NO_MESSAGES: &str = "No messages";

pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    match dispatch(&state, method, params, body).await {
        Ok(res) => res,
        Err(e) => e.into_response(),
    }
}

async fn dispatch(
    state: &AppState,
    method: Method,
    params: HashMap<String, String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.store()?;

    match method {
        Method::GET => {
            let user_id =
                query_id(&params, "userId")?.ok_or_else(|| ApiError::invalid("User ID required"))?;

            match params.get("action").map(String::as_str).unwrap_or("chats") {
                "chats" => list_chats(state, user_id).await,
                "messages" => {
                    let chat_id = query_id(&params, "chatId")?
                        .ok_or_else(|| ApiError::invalid("Chat ID required"))?;
                    list_messages(state, chat_id).await
                }
                _ => Err(ApiError::MethodNotAllowed),
            }
        }
        Method::POST => {
            let req: SendMessageRequest = parse_body(&body)?;
            let user_id = req
                .user_id
                .ok_or_else(|| ApiError::invalid("User ID required"))?;

            match req.action.as_deref() {
                Some("send_message") => send_message(state, user_id, req).await,
                _ => Err(ApiError::MethodNotAllowed),
            }
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn list_chats(state: &AppState, user_id: i64) -> Result<Response, ApiError> {
    let rows = with_store(state, move |db| Ok(db.list_chats_for_user(user_id)?)).await?;

    let chats = rows
        .into_iter()
        .map(|row| -> anyhow::Result<ChatSummary> {
            let timestamp = match row.last_message_at.as_deref() {
                Some(raw) => time::clock(raw)?,
                None => String::new(),
            };
            Ok(ChatSummary {
                id: row.id,
                name: row.name,
                description: row.description,
                is_group: row.is_group,
                last_message: row.last_message.unwrap_or_else(|| NO_MESSAGES.to_string()),
                timestamp,
                unread: row.unread,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(response::json(StatusCode::OK, &ChatListResponse { chats }))
}

/// Public read: membership is only enforced when sending.
async fn list_messages(state: &AppState, chat_id: i64) -> Result<Response, ApiError> {
    let rows = with_store(state, move |db| {
        Ok(db.get_chat_messages(chat_id, MESSAGE_PAGE_LIMIT)?)
    })
    .await?;
    debug!("Loaded {} messages for chat {}", rows.len(), chat_id);

    let messages = rows
        .into_iter()
        .map(|row| -> anyhow::Result<ChatMessage> {
            Ok(ChatMessage {
                id: row.id,
                user_id: row.user_id,
                timestamp: time::clock(&row.created_at)?,
                text: row.text,
                username: row.username,
                him_id: row.him_id,
                is_premium: row.is_premium,
                is_verified: row.is_verified,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(response::json(StatusCode::OK, &MessageListResponse { messages }))
}

async fn send_message(
    state: &AppState,
    user_id: i64,
    req: SendMessageRequest,
) -> Result<Response, ApiError> {
    let text = req.message.trim().to_string();
    let chat_id = match req.chat_id {
        Some(id) if !text.is_empty() => id,
        _ => return Err(ApiError::invalid("Chat ID and message required")),
    };

    let sent = with_store(state, move |db| {
        db.send_message(chat_id, user_id, &text, Utc::now())?
            .ok_or(ApiError::NotAMember)
    })
    .await?;

    info!("User {} posted message {} in chat {}", user_id, sent.id, chat_id);
    Ok(response::json(
        StatusCode::CREATED,
        &SendMessageResponse {
            success: true,
            message_id: sent.id,
            timestamp: time::clock(&sent.created_at)?,
        },
    ))
}
