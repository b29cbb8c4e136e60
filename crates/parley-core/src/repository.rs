//! Conversation and message records on top of [`Database`].

use crate::db::{now_timestamp, parse_timestamp};
use crate::{Database, ParleyError, Result};
use chrono::Local;
use parley_types::{Conversation, Message, MessageRole};
use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::debug;

/// Reads and writes conversations and their messages.
///
/// Each method opens its own connection; no transaction spans two calls.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    db: Database,
}

impl ConversationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a conversation for a remote thread and return its id.
    ///
    /// Without a title, one is generated from the current local time.
    pub fn create(&self, thread_id: &str, title: Option<&str>) -> Result<i64> {
        let title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => default_title(),
        };
        let now = now_timestamp();

        let conn = self.db.connect()?;
        let inserted = conn.execute(
            "INSERT INTO conversations (thread_id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![thread_id, title, now],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(ParleyError::Conflict(format!(
                    "thread {} already has a conversation",
                    thread_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        debug!(target: "parley::store", "Created conversation {} for thread {}", id, thread_id);
        Ok(id)
    }

    pub fn find_by_thread_id(&self, thread_id: &str) -> Result<Option<Conversation>> {
        let conn = self.db.connect()?;
        let conversation = conn
            .query_row(
                "SELECT * FROM conversations WHERE thread_id = ?1",
                params![thread_id],
                Self::row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Conversation>> {
        let conn = self.db.connect()?;
        let conversation = conn
            .query_row(
                "SELECT * FROM conversations WHERE id = ?1",
                params![id],
                Self::row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    /// List all conversations, most recently updated first.
    pub fn list_all(&self) -> Result<Vec<Conversation>> {
        let conn = self.db.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM conversations ORDER BY updated_at DESC, id DESC")?;
        let conversations = stmt
            .query_map([], Self::row_to_conversation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(conversations)
    }

    /// Store a message and bump the parent's `updated_at` in one transaction.
    pub fn append_message(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM conversations WHERE id = ?1)",
            params![conversation_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(ParleyError::ConversationNotFound(conversation_id));
        }

        let timestamp = now_timestamp();
        tx.execute(
            "INSERT INTO messages (conversation_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![conversation_id, role.as_str(), content, timestamp],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![timestamp, conversation_id],
        )?;
        tx.commit()?;

        Ok(Message {
            id,
            conversation_id,
            role,
            content: content.to_string(),
            timestamp: parse_timestamp(&timestamp),
        })
    }

    /// Messages of a conversation, oldest first. Unknown ids yield an empty list.
    pub fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?;
        let messages = stmt
            .query_map(params![conversation_id], Self::row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    pub fn count_messages(&self, conversation_id: i64) -> Result<usize> {
        let conn = self.db.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn set_title(&self, conversation_id: i64, title: &str) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE conversations SET title = ?1 WHERE id = ?2",
            params![title, conversation_id],
        )?;
        Ok(())
    }

    /// Delete a conversation and, through the cascade, its messages.
    ///
    /// Returns whether anything was removed; deleting an unknown id is not an error.
    pub fn delete(&self, conversation_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        let removed = conn.execute(
            "DELETE FROM conversations WHERE id = ?1",
            params![conversation_id],
        )?;
        Ok(removed > 0)
    }

    fn row_to_conversation(row: &rusqlite::Row) -> rusqlite::Result<Conversation> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Conversation {
            id: row.get("id")?,
            thread_id: row.get("thread_id")?,
            title: row.get("title")?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
        let role: String = row.get("role")?;
        let role = role.parse::<MessageRole>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let timestamp: String = row.get("timestamp")?;

        Ok(Message {
            id: row.get("id")?,
            conversation_id: row.get("conversation_id")?,
            role,
            content: row.get("content")?,
            timestamp: parse_timestamp(&timestamp),
        })
    }
}

fn default_title() -> String {
    format!("Conversation {}", Local::now().format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (ConversationRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("test.db")).unwrap();
        (ConversationRepository::new(db), temp_dir)
    }

    #[test]
    fn test_create_and_find_by_thread_id() {
        let (repo, _dir) = create_test_repo();

        let id = repo.create("thread_1", Some("Greetings")).unwrap();
        let conversation = repo.find_by_thread_id("thread_1").unwrap().unwrap();

        assert_eq!(conversation.id, id);
        assert_eq!(conversation.thread_id, "thread_1");
        assert_eq!(conversation.title, "Greetings");
        assert_eq!(conversation.created_at, conversation.updated_at);
        assert_eq!(repo.find_by_id(id).unwrap(), Some(conversation));
    }

    #[test]
    fn test_create_duplicate_thread_conflicts() {
        let (repo, _dir) = create_test_repo();

        repo.create("thread_dup", None).unwrap();
        let err = repo.create("thread_dup", Some("Again")).unwrap_err();

        assert!(matches!(err, ParleyError::Conflict(_)));
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_create_without_title_uses_timestamp_label() {
        let (repo, _dir) = create_test_repo();

        let id = repo.create("thread_untitled", None).unwrap();
        let conversation = repo.find_by_id(id).unwrap().unwrap();

        let label = conversation.title.strip_prefix("Conversation ").unwrap();
        // YYYY-MM-DD HH:MM
        assert_eq!(label.len(), 16);
        assert!(chrono::NaiveDateTime::parse_from_str(label, "%Y-%m-%d %H:%M").is_ok());
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let (repo, _dir) = create_test_repo();

        assert!(repo.find_by_id(42).unwrap().is_none());
        assert!(repo.find_by_thread_id("nope").unwrap().is_none());
        assert!(repo.list_messages(42).unwrap().is_empty());
    }

    #[test]
    fn test_append_message_bumps_updated_at() {
        let (repo, _dir) = create_test_repo();
        let id = repo.create("thread_bump", None).unwrap();
        let before = repo.find_by_id(id).unwrap().unwrap();

        let message = repo.append_message(id, MessageRole::User, "Hello").unwrap();
        let after = repo.find_by_id(id).unwrap().unwrap();

        assert_eq!(message.conversation_id, id);
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(after.updated_at, message.timestamp);
        assert!(after.updated_at > before.created_at);
    }

    #[test]
    fn test_append_message_to_unknown_conversation() {
        let (repo, _dir) = create_test_repo();

        let err = repo
            .append_message(99, MessageRole::User, "orphan")
            .unwrap_err();

        assert!(matches!(err, ParleyError::ConversationNotFound(99)));
        assert_eq!(repo.count_messages(99).unwrap(), 0);
    }

    #[test]
    fn test_list_all_orders_by_recent_activity() {
        let (repo, _dir) = create_test_repo();
        let first = repo.create("thread_a", None).unwrap();
        let second = repo.create("thread_b", None).unwrap();

        let ids: Vec<i64> = repo.list_all().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second, first]);

        repo.append_message(first, MessageRole::User, "ping").unwrap();
        let ids: Vec<i64> = repo.list_all().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_set_title_overwrites() {
        let (repo, _dir) = create_test_repo();
        let id = repo.create("thread_title", Some("New Conversation")).unwrap();

        repo.set_title(id, "Renamed").unwrap();

        assert_eq!(repo.find_by_id(id).unwrap().unwrap().title, "Renamed");
    }

    #[test]
    fn test_delete_cascades_messages() {
        let (repo, _dir) = create_test_repo();
        let id = repo.create("thread_del", None).unwrap();
        repo.append_message(id, MessageRole::User, "q").unwrap();
        repo.append_message(id, MessageRole::Assistant, "a").unwrap();

        assert!(repo.delete(id).unwrap());

        assert!(repo.find_by_id(id).unwrap().is_none());
        assert!(repo.list_messages(id).unwrap().is_empty());
        let conn = repo.db.connect().unwrap();
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let (repo, _dir) = create_test_repo();

        assert!(!repo.delete(12345).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_messages_come_back_in_append_order(
            contents in proptest::collection::vec("[a-zA-Z0-9 ]{0,24}", 1..12)
        ) {
            let (repo, _dir) = create_test_repo();
            let id = repo.create("thread_prop", None).unwrap();

            for (i, content) in contents.iter().enumerate() {
                let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
                repo.append_message(id, role, content).unwrap();
            }

            let messages = repo.list_messages(id).unwrap();
            prop_assert_eq!(messages.len(), contents.len());
            prop_assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            let stored: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
            let expected: Vec<&str> = contents.iter().map(String::as_str).collect();
            prop_assert_eq!(stored, expected);
        }
    }
}
