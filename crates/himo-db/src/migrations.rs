use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
    )?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                him_id          TEXT NOT NULL UNIQUE,
                him_coins       INTEGER NOT NULL DEFAULT 0,
                is_premium      INTEGER NOT NULL DEFAULT 0,
                is_verified     INTEGER NOT NULL DEFAULT 0,
                is_admin        INTEGER NOT NULL DEFAULT 0,
                is_banned       INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                last_login      TEXT
            );

            CREATE TABLE chats (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                is_group        INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE chat_members (
                chat_id         INTEGER NOT NULL REFERENCES chats(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (chat_id, user_id)
            );

            CREATE INDEX idx_chat_members_user ON chat_members(user_id);

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id         INTEGER NOT NULL REFERENCES chats(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                message_text    TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_messages_chat ON messages(chat_id, created_at);
            CREATE INDEX idx_messages_user ON messages(user_id, created_at);

            CREATE TABLE reports (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                reported_user_id     INTEGER NOT NULL REFERENCES users(id),
                reported_by_user_id  INTEGER NOT NULL REFERENCES users(id),
                reason               TEXT NOT NULL,
                status               TEXT NOT NULL DEFAULT 'pending',
                created_at           TEXT NOT NULL
            );

            -- Seed the default chat every new user joins
            INSERT INTO chats (id, name, description, is_group)
                VALUES (1, 'General', 'Chat for everyone on Himo', 1);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
