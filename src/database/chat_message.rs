use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::schema::enum_def::MessageRole;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = chat_messages)]
    pub struct ChatMessage {
        pub id: String,
        pub session_id: String,
        pub role: MessageRole,
        pub content: String,
        pub metadata: Option<String>,
        pub timestamp: i64,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = chat_messages)]
    pub struct NewChatMessage {
        pub id: String,
        pub session_id: String,
        pub role: MessageRole,
        pub content: String,
        pub metadata: Option<String>,
        pub timestamp: i64,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = chat_messages)]
    pub struct UpdateChatMessageData {
        pub content: Option<String>,
        pub metadata: Option<String>,
    }
}

impl ChatMessage {
    pub fn create(new_message: &NewChatMessage) -> DbResult<ChatMessage> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_message = diesel::insert_into(chat_messages::table)
                .values(NewChatMessageDb::to_db(new_message))
                .returning(ChatMessageDb::as_returning())
                .get_result::<ChatMessageDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to insert chat message: {}", e)))
                })?;
            Ok(db_message.from_db())
        })
    }

    /// History is append-only for HTTP clients; no route reaches this.
    #[allow(dead_code)]
    pub fn update(id: &str, update_data: &UpdateChatMessageData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chat_messages::table.filter(
                    chat_messages::dsl::id.eq(id).and(chat_messages::dsl::deleted_at.is_null()),
                ),
            )
            .set((
                UpdateChatMessageDataDb::to_db(update_data),
                chat_messages::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to update chat message {}: {}", id, e)))
            })
        })
    }

    #[allow(dead_code)]
    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chat_messages::table.filter(
                    chat_messages::dsl::id.eq(id).and(chat_messages::dsl::deleted_at.is_null()),
                ),
            )
            .set((
                chat_messages::dsl::deleted_at.eq(current_time),
                chat_messages::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to delete chat message {}: {}", id, e)))
            })
        })
    }

    #[allow(dead_code)]
    pub fn get_by_id(id: &str) -> DbResult<Option<ChatMessage>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_message_opt = chat_messages::table
                .filter(chat_messages::dsl::id.eq(id).and(chat_messages::dsl::deleted_at.is_null()))
                .select(ChatMessageDb::as_select())
                .first::<ChatMessageDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching chat message {}: {}", id, e)))
                })?;

            Ok(db_message_opt.map(|db_m| db_m.from_db()))
        })
    }

    /// Lists the live messages of a session in conversation order.
    pub fn list_by_session(session_id: &str) -> DbResult<Vec<ChatMessage>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_messages = chat_messages::table
                .filter(
                    chat_messages::dsl::session_id
                        .eq(session_id)
                        .and(chat_messages::dsl::deleted_at.is_null()),
                )
                .order(chat_messages::dsl::timestamp.asc())
                .select(ChatMessageDb::as_select())
                .load::<ChatMessageDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to list chat messages for session {}: {}",
                        session_id, e
                    )))
                })?;

            Ok(db_messages.into_iter().map(|db_m| db_m.from_db()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::database::chat_session::{ChatSession, NewChatSession};
    use crate::database::chatbot::{Chatbot, NewChatbot};
    use crate::database::user::{NewUser, User};
    use crate::utils::generate_id;

    fn session_fixture() -> String {
        let now = Utc::now().timestamp_millis();
        let user = User::create(&NewUser {
            id: generate_id(),
            email: format!("{}@example.com", generate_id()),
            name: "Store Test".to_string(),
            password_hash: None,
            user_type: "free".to_string(),
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        let chatbot = Chatbot::create(&NewChatbot {
            id: generate_id(),
            name: "History Bot".to_string(),
            model: "gpt-4".to_string(),
            response_language: "en".to_string(),
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        })
        .unwrap();
        let session = ChatSession::create(&NewChatSession {
            id: generate_id(),
            user_id: user.id,
            chatbot_id: chatbot.id,
            title: "History".to_string(),
            status: "active".to_string(),
            metadata: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        session.id
    }

    #[test]
    fn message_lifecycle_round_trips() {
        let session_id = session_fixture();
        let now = Utc::now().timestamp_millis();

        let created = ChatMessage::create(&NewChatMessage {
            id: generate_id(),
            session_id: session_id.clone(),
            role: MessageRole::User,
            content: "original".to_string(),
            metadata: None,
            timestamp: now,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        let fetched = ChatMessage::get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched.content, "original");
        assert_eq!(fetched.role, MessageRole::User);

        let update = UpdateChatMessageData {
            content: Some("edited".to_string()),
            metadata: None,
        };
        assert_eq!(ChatMessage::update(&created.id, &update).unwrap(), 1);
        let edited = ChatMessage::get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(edited.content, "edited");
        assert!(edited.updated_at >= created.updated_at);

        assert_eq!(ChatMessage::delete(&created.id).unwrap(), 1);
        assert!(ChatMessage::get_by_id(&created.id).unwrap().is_none());
        assert!(ChatMessage::list_by_session(&session_id).unwrap().is_empty());
    }

    #[test]
    fn update_of_unknown_message_touches_no_rows() {
        let update = UpdateChatMessageData {
            content: Some("ghost".to_string()),
            metadata: None,
        };
        assert_eq!(ChatMessage::update(&generate_id(), &update).unwrap(), 0);
        assert_eq!(ChatMessage::delete(&generate_id()).unwrap(), 0);
    }
}
