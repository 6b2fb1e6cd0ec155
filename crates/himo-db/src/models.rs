/// Row types read straight out of SQLite.
/// Distinct from himo-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub him_id: String,
    pub him_coins: i64,
    pub is_premium: bool,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_banned: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// A chat as seen by one member, with its latest message and unread count.
pub struct ChatSummaryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_group: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread: i64,
}

/// A chat message joined with its sender.
pub struct ChatMessageRow {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: String,
    pub username: String,
    pub him_id: String,
    pub is_premium: bool,
    pub is_verified: bool,
}

pub struct SentMessage {
    pub id: i64,
    pub created_at: String,
}

/// A message by one user, joined with the chat it was posted in.
pub struct UserMessageRow {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub chat_name: String,
}

pub struct ReportRow {
    pub id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: String,
    pub reported_user: String,
    pub reported_by: String,
}

/// Outcome of a registration attempt.
pub enum Registration {
    Created(UserRow),
    UsernameTaken,
    HimIdExhausted,
}

/// Outcome of a coin grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinGrant {
    /// New balance.
    Granted(i64),
    NoSuchUser,
    /// The balance would pass `i64::MAX`.
    Overflow,
}

/// What a user id is allowed to do on the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Admin,
    Member,
    Unknown,
}
