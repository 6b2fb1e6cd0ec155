use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids;

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub action: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Everything about a user except its credential secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub him_id: String,
    pub him_coins: i64,
    pub is_premium: bool,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserProfile,
}

// -- Chats --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub action: Option<String>,
    #[serde(default, deserialize_with = "ids::optional")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "ids::optional")]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_group: bool,
    pub last_message: String,
    /// `HH:MM` of the latest message, empty when the chat has none.
    pub timestamp: String,
    pub unread: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub timestamp: String,
    pub username: String,
    pub him_id: String,
    pub is_premium: bool,
    pub is_verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: i64,
    pub timestamp: String,
}

// -- Admin --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionRequest {
    pub action: Option<String>,
    #[serde(default, deserialize_with = "ids::optional")]
    pub admin_id: Option<i64>,
    #[serde(default, deserialize_with = "ids::optional")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "ids::optional")]
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reported_user: String,
    pub reported_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub reports: Vec<Report>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub chat_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMessageListResponse {
    pub messages: Vec<UserMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
