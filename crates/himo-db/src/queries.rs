use crate::him_id::{HIM_ID_ATTEMPTS, HimIdGenerator, allocate_him_id};
use crate::models::{
    Capability, ChatMessageRow, CoinGrant, ChatSummaryRow, Registration, ReportRow, SentMessage,
    UserMessageRow, UserRow,
};
use crate::{DEFAULT_CHAT_ID, Database, SUPER_ADMIN_ID, time};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Params, Row};

const USER_COLUMNS: &str = "id, username, password_hash, him_id, him_coins, is_premium, \
     is_verified, is_admin, is_banned, created_at, last_login";

/// Username a soft-deleted user is renamed to.
pub fn deleted_username(id: i64) -> String {
    format!("DELETED_{}", id)
}

impl Database {
    // -- Users --

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Create a user and its default-chat membership in one transaction.
    pub fn register_user<G>(
        &self,
        username: &str,
        password_hash: &str,
        him_ids: &mut G,
        at: DateTime<Utc>,
    ) -> Result<Registration>
    where
        G: HimIdGenerator + ?Sized,
    {
        self.with_tx(|tx| {
            if query_user_by_username(tx, username)?.is_some() {
                return Ok(Registration::UsernameTaken);
            }

            let Some(him_id) =
                allocate_him_id(him_ids, username, HIM_ID_ATTEMPTS, |c| him_id_taken(tx, c))?
            else {
                return Ok(Registration::HimIdExhausted);
            };

            tx.execute(
                "INSERT INTO users (username, password_hash, him_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (username, password_hash, &him_id, time::to_db(at)),
            )?;
            let id = tx.last_insert_rowid();
            add_chat_member(tx, DEFAULT_CHAT_ID, id)?;

            let user = query_user_by_id(tx, id)?
                .ok_or_else(|| anyhow!("User {} vanished after insert", id))?;
            Ok(Registration::Created(user))
        })
    }

    /// Create the super-admin (id 1) unless that id is already in use.
    /// Returns whether a user was created.
    pub fn ensure_super_admin<G>(
        &self,
        username: &str,
        password_hash: &str,
        him_ids: &mut G,
        at: DateTime<Utc>,
    ) -> Result<bool>
    where
        G: HimIdGenerator + ?Sized,
    {
        self.with_tx(|tx| {
            if query_user_by_id(tx, SUPER_ADMIN_ID)?.is_some() {
                return Ok(false);
            }
            if query_user_by_username(tx, username)?.is_some() {
                return Err(anyhow!(
                    "Username '{}' is already taken by a regular user",
                    username
                ));
            }

            let him_id =
                allocate_him_id(him_ids, username, HIM_ID_ATTEMPTS, |c| him_id_taken(tx, c))?
                    .ok_or_else(|| anyhow!("Could not generate unique HIM ID"))?;

            tx.execute(
                "INSERT INTO users (id, username, password_hash, him_id, is_verified, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, 1, ?5)",
                (SUPER_ADMIN_ID, username, password_hash, &him_id, time::to_db(at)),
            )?;
            add_chat_member(tx, DEFAULT_CHAT_ID, SUPER_ADMIN_ID)?;
            Ok(true)
        })
    }

    /// Stamp a successful login and return the refreshed row.
    pub fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<Option<UserRow>> {
        self.with_tx(|tx| {
            tx.execute(
                "UPDATE users SET last_login = ?1 WHERE id = ?2",
                (time::to_db(at), id),
            )?;
            query_user_by_id(tx, id)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Single authorization predicate for the admin surface.
    pub fn capability(&self, user_id: i64) -> Result<Capability> {
        self.with_conn(|conn| {
            let is_admin: Option<bool> = conn
                .query_row(
                    "SELECT is_admin FROM users WHERE id = ?1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(match is_admin {
                Some(true) => Capability::Admin,
                Some(false) => Capability::Member,
                None => Capability::Unknown,
            })
        })
    }

    // -- Moderation --
    //
    // Each returns the number of rows changed. Zero means the target does not
    // exist or is protected.

    pub fn ban_user(&self, id: i64) -> Result<usize> {
        self.update_user(
            "UPDATE users SET is_banned = 1 WHERE id = ?1 AND id != ?2",
            (id, SUPER_ADMIN_ID),
        )
    }

    pub fn unban_user(&self, id: i64) -> Result<usize> {
        self.update_user("UPDATE users SET is_banned = 0 WHERE id = ?1", [id])
    }

    pub fn promote_admin(&self, id: i64) -> Result<usize> {
        self.update_user("UPDATE users SET is_admin = 1 WHERE id = ?1", [id])
    }

    pub fn demote_admin(&self, id: i64) -> Result<usize> {
        self.update_user(
            "UPDATE users SET is_admin = 0 WHERE id = ?1 AND id != ?2",
            (id, SUPER_ADMIN_ID),
        )
    }

    pub fn verify_user(&self, id: i64) -> Result<usize> {
        self.update_user("UPDATE users SET is_verified = 1 WHERE id = ?1", [id])
    }

    /// Ban the user and overwrite its username with [`deleted_username`].
    pub fn soft_delete_user(&self, id: i64) -> Result<usize> {
        self.update_user(
            "UPDATE users SET is_banned = 1, username = 'DELETED_' || id
             WHERE id = ?1 AND id != ?2",
            (id, SUPER_ADMIN_ID),
        )
    }

    /// Add `amount` to a balance. Read and write share one transaction under
    /// the connection lock, so concurrent grants never lose an update.
    /// A sum past `i64::MAX` is refused; SQLite would store it as REAL.
    pub fn grant_coins(&self, id: i64, amount: i64) -> Result<CoinGrant> {
        self.with_tx(|tx| {
            let balance: Option<i64> = tx
                .query_row("SELECT him_coins FROM users WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(balance) = balance else {
                return Ok(CoinGrant::NoSuchUser);
            };
            let Some(total) = balance.checked_add(amount) else {
                return Ok(CoinGrant::Overflow);
            };

            tx.execute("UPDATE users SET him_coins = ?1 WHERE id = ?2", (total, id))?;
            Ok(CoinGrant::Granted(total))
        })
    }

    fn update_user<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.with_tx(|tx| Ok(tx.execute(sql, params)?))
    }

    // -- Chats --

    pub fn list_chats_for_user(&self, user_id: i64) -> Result<Vec<ChatSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, c.description, c.is_group,
                        (SELECT m.message_text FROM messages m WHERE m.chat_id = c.id
                         ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
                        (SELECT m.created_at FROM messages m WHERE m.chat_id = c.id
                         ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id
                         AND m.created_at > COALESCE((SELECT u.last_login FROM users u WHERE u.id = ?1), ?2)) AS unread
                 FROM chats c
                 JOIN chat_members cm ON cm.chat_id = c.id
                 WHERE cm.user_id = ?1
                 ORDER BY last_message_at DESC NULLS LAST, c.id ASC",
            )?;

            let rows = stmt
                .query_map((user_id, time::EPOCH), |row| {
                    Ok(ChatSummaryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        is_group: row.get(3)?,
                        last_message: row.get(4)?,
                        last_message_at: row.get(5)?,
                        unread: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Earliest `limit` messages of a chat, oldest first.
    pub fn get_chat_messages(&self, chat_id: i64, limit: u32) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch sender details in a single query
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, m.message_text, m.created_at,
                        u.username, u.him_id, u.is_premium, u.is_verified
                 FROM messages m
                 JOIN users u ON m.user_id = u.id
                 WHERE m.chat_id = ?1
                 ORDER BY m.created_at ASC, m.id ASC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map((chat_id, limit), |row| {
                    Ok(ChatMessageRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        text: row.get(2)?,
                        created_at: row.get(3)?,
                        username: row.get(4)?,
                        him_id: row.get(5)?,
                        is_premium: row.get(6)?,
                        is_verified: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn is_member(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| query_is_member(conn, chat_id, user_id))
    }

    pub fn add_chat_member(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.with_tx(|tx| add_chat_member(tx, chat_id, user_id))
    }

    /// Insert a message if `user_id` belongs to the chat.
    /// Returns `None` (and writes nothing) for non-members.
    pub fn send_message(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<SentMessage>> {
        self.with_tx(|tx| {
            if !query_is_member(tx, chat_id, user_id)? {
                return Ok(None);
            }

            let created_at = time::to_db(at);
            tx.execute(
                "INSERT INTO messages (chat_id, user_id, message_text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (chat_id, user_id, text, &created_at),
            )?;

            Ok(Some(SentMessage {
                id: tx.last_insert_rowid(),
                created_at,
            }))
        })
    }

    // -- Admin reads --

    /// Most recent `limit` messages by one user across all chats, newest first.
    pub fn get_user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<UserMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.message_text, m.created_at, c.name
                 FROM messages m
                 JOIN chats c ON m.chat_id = c.id
                 WHERE m.user_id = ?1
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map((user_id, limit), |row| {
                    Ok(UserMessageRow {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        created_at: row.get(2)?,
                        chat_name: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn list_reports(&self) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.reason, r.status, r.created_at,
                        reported.username, reporter.username
                 FROM reports r
                 JOIN users reported ON r.reported_user_id = reported.id
                 JOIN users reporter ON r.reported_by_user_id = reporter.id
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ReportRow {
                        id: row.get(0)?,
                        reason: row.get(1)?,
                        status: row.get(2)?,
                        created_at: row.get(3)?,
                        reported_user: row.get(4)?,
                        reported_by: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        him_id: row.get(3)?,
        him_coins: row.get(4)?,
        is_premium: row.get(5)?,
        is_verified: row.get(6)?,
        is_admin: row.get(7)?,
        is_banned: row.get(8)?,
        created_at: row.get(9)?,
        last_login: row.get(10)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [username], map_user).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [id], map_user).optional()?;
    Ok(row)
}

fn him_id_taken(conn: &Connection, him_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE him_id = ?1", [him_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

fn query_is_member(conn: &Connection, chat_id: i64, user_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM chat_members WHERE chat_id = ?1 AND user_id = ?2",
            (chat_id, user_id),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn add_chat_member(conn: &Connection, chat_id: i64, user_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO chat_members (chat_id, user_id) VALUES (?1, ?2)",
        (chat_id, user_id),
    )?;
    Ok(())
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::him_id::format_him_id;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn register(db: &Database, username: &str) -> UserRow {
        let mut ids = |name: &str, attempt: u32| format!("HIM-{}-{}", name, attempt);
        match db.register_user(username, "hash", &mut ids, at(8, 0)).unwrap() {
            Registration::Created(user) => user,
            _ => panic!("registration of {} failed", username),
        }
    }

    fn create_chat(db: &Database, name: &str) -> i64 {
        db.with_conn(|conn| {
            conn.execute("INSERT INTO chats (name, is_group) VALUES (?1, 1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
        .unwrap()
    }

    fn message_count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn registration_creates_user_and_default_membership() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");

        assert_eq!(alice.username, "alice");
        assert_eq!(alice.him_coins, 0);
        assert!(!alice.is_admin && !alice.is_banned && !alice.is_premium && !alice.is_verified);
        assert!(alice.last_login.is_none());
        assert!(db.is_member(DEFAULT_CHAT_ID, alice.id).unwrap());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        register(&db, "alice");

        let mut ids = |_: &str, attempt: u32| format_him_id(500 + attempt as u64);
        let again = db.register_user("alice", "other", &mut ids, at(9, 0)).unwrap();
        assert!(matches!(again, Registration::UsernameTaken));
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn exhausted_him_ids_leave_no_user_behind() {
        let db = Database::open_in_memory().unwrap();
        let mut fixed = |_: &str, _: u32| "HIM000042".to_string();
        assert!(matches!(
            db.register_user("first", "hash", &mut fixed, at(8, 0)).unwrap(),
            Registration::Created(_)
        ));

        let outcome = db.register_user("second", "hash", &mut fixed, at(8, 1)).unwrap();
        assert!(matches!(outcome, Registration::HimIdExhausted));
        assert!(db.get_user_by_username("second").unwrap().is_none());
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");

        let result: Result<()> = db.with_tx(|tx| {
            tx.execute("UPDATE users SET him_coins = 99 WHERE id = ?1", [alice.id])?;
            Err(anyhow!("boom"))
        });

        assert!(result.is_err());
        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().him_coins, 0);
    }

    #[test]
    fn unread_counts_follow_last_login() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        let bob = register(&db, "bob");

        db.send_message(DEFAULT_CHAT_ID, bob.id, "one", at(10, 0)).unwrap();
        db.send_message(DEFAULT_CHAT_ID, bob.id, "two", at(11, 0)).unwrap();
        db.send_message(DEFAULT_CHAT_ID, bob.id, "three", at(12, 0)).unwrap();

        let chats = db.list_chats_for_user(alice.id).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].unread, 3);

        db.record_login(alice.id, at(11, 30)).unwrap();
        let chats = db.list_chats_for_user(alice.id).unwrap();
        assert_eq!(chats[0].unread, 1);
        assert_eq!(chats[0].last_message.as_deref(), Some("three"));
        assert_eq!(chats[0].last_message_at.as_deref(), Some(time::to_db(at(12, 0)).as_str()));
    }

    #[test]
    fn chats_order_by_latest_message_with_empty_chats_last() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        let quiet = create_chat(&db, "quiet");
        let busy = create_chat(&db, "busy");
        db.add_chat_member(quiet, alice.id).unwrap();
        db.add_chat_member(busy, alice.id).unwrap();

        db.send_message(DEFAULT_CHAT_ID, alice.id, "morning", at(9, 0)).unwrap();
        db.send_message(busy, alice.id, "noon", at(12, 0)).unwrap();

        let ids: Vec<i64> = db
            .list_chats_for_user(alice.id)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![busy, DEFAULT_CHAT_ID, quiet]);
    }

    #[test]
    fn non_member_cannot_send() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        let private = create_chat(&db, "private");

        let sent = db.send_message(private, alice.id, "hello?", at(9, 0)).unwrap();
        assert!(sent.is_none());
        assert_eq!(message_count(&db), 0);
    }

    #[test]
    fn chat_messages_are_oldest_first_and_capped() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        for minute in (0..5).rev() {
            db.send_message(DEFAULT_CHAT_ID, alice.id, &format!("m{}", minute), at(9, minute))
                .unwrap();
        }

        let texts: Vec<String> = db
            .get_chat_messages(DEFAULT_CHAT_ID, 3)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn grants_accumulate() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");

        db.grant_coins(alice.id, 10).unwrap();
        db.grant_coins(alice.id, 50).unwrap();
        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().him_coins, 60);
        assert_eq!(db.grant_coins(alice.id, 25).unwrap(), CoinGrant::Granted(85));
        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().him_coins, 85);
    }

    #[test]
    fn grant_past_i64_max_leaves_balance_untouched() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        db.grant_coins(alice.id, 10).unwrap();

        assert_eq!(db.grant_coins(alice.id, i64::MAX).unwrap(), CoinGrant::Overflow);
        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().him_coins, 10);

        assert_eq!(db.grant_coins(alice.id, i64::MAX - 10).unwrap(), CoinGrant::Granted(i64::MAX));
        assert_eq!(db.list_users().unwrap()[0].him_coins, i64::MAX);
    }

    #[test]
    fn grant_to_unknown_user_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.grant_coins(42, 5).unwrap(), CoinGrant::NoSuchUser);
    }

    #[test]
    fn concurrent_grants_sum_exactly() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let alice = register(&db, "alice");

        let handles: Vec<_> = (1..=8)
            .map(|amount| {
                let db = db.clone();
                std::thread::spawn(move || db.grant_coins(alice.id, amount).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().him_coins, 36);
    }

    #[test]
    fn super_admin_is_protected() {
        let db = Database::open_in_memory().unwrap();
        let mut ids = |_: &str, _: u32| "HIM000001".to_string();
        assert!(db.ensure_super_admin("root", "hash", &mut ids, at(7, 0)).unwrap());
        assert!(!db.ensure_super_admin("root", "hash", &mut ids, at(7, 0)).unwrap());

        assert_eq!(db.ban_user(SUPER_ADMIN_ID).unwrap(), 0);
        assert_eq!(db.demote_admin(SUPER_ADMIN_ID).unwrap(), 0);
        assert_eq!(db.soft_delete_user(SUPER_ADMIN_ID).unwrap(), 0);

        let root = db.get_user_by_id(SUPER_ADMIN_ID).unwrap().unwrap();
        assert_eq!(root.username, "root");
        assert!(root.is_admin && !root.is_banned);
        assert_eq!(db.capability(SUPER_ADMIN_ID).unwrap(), Capability::Admin);
    }

    #[test]
    fn soft_delete_bans_and_renames() {
        let db = Database::open_in_memory().unwrap();
        let mut last = None;
        for name in ["u1", "u2", "u3", "u4", "u5"] {
            last = Some(register(&db, name));
        }
        let target = last.unwrap();
        assert_eq!(target.id, 5);

        assert_eq!(db.soft_delete_user(5).unwrap(), 1);
        let deleted = db.get_user_by_id(5).unwrap().unwrap();
        assert!(deleted.is_banned);
        assert_eq!(deleted.username, deleted_username(5));
        assert_eq!(deleted.username, "DELETED_5");
    }

    #[test]
    fn capability_distinguishes_members_and_strangers() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");

        assert_eq!(db.capability(alice.id).unwrap(), Capability::Member);
        assert_eq!(db.capability(404).unwrap(), Capability::Unknown);

        db.promote_admin(alice.id).unwrap();
        assert_eq!(db.capability(alice.id).unwrap(), Capability::Admin);
    }

    #[test]
    fn admin_reads_join_names() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "alice");
        let bob = register(&db, "bob");
        db.send_message(DEFAULT_CHAT_ID, bob.id, "first", at(9, 0)).unwrap();
        db.send_message(DEFAULT_CHAT_ID, bob.id, "second", at(10, 0)).unwrap();

        let history = db.get_user_messages(bob.id, 100).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "second");
        assert_eq!(history[0].chat_name, "General");

        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (reported_user_id, reported_by_user_id, reason, created_at)
                 VALUES (?1, ?2, 'spam', ?3)",
                (bob.id, alice.id, time::to_db(at(11, 0))),
            )?;
            Ok(())
        })
        .unwrap();

        let reports = db.list_reports().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reported_user, "bob");
        assert_eq!(reports[0].reported_by, "alice");
        assert_eq!(reports[0].status, "pending");
    }
}
