use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = chat_sessions)]
    pub struct ChatSession {
        pub id: String,
        pub user_id: String,
        pub chatbot_id: String,
        pub title: String,
        pub status: String,
        pub metadata: Option<String>,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = chat_sessions)]
    pub struct NewChatSession {
        pub id: String,
        pub user_id: String,
        pub chatbot_id: String,
        pub title: String,
        pub status: String,
        pub metadata: Option<String>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = chat_sessions)]
    pub struct UpdateChatSessionData {
        pub title: Option<String>,
        pub status: Option<String>,
        pub metadata: Option<String>,
    }
}

impl ChatSession {
    pub fn create(new_session: &NewChatSession) -> DbResult<ChatSession> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_session = diesel::insert_into(chat_sessions::table)
                .values(NewChatSessionDb::to_db(new_session))
                .returning(ChatSessionDb::as_returning())
                .get_result::<ChatSessionDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to insert chat session: {}", e)))
                })?;
            Ok(db_session.from_db())
        })
    }

    pub fn update(id: &str, update_data: &UpdateChatSessionData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chat_sessions::table.filter(
                    chat_sessions::dsl::id.eq(id).and(chat_sessions::dsl::deleted_at.is_null()),
                ),
            )
            .set((
                UpdateChatSessionDataDb::to_db(update_data),
                chat_sessions::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to update chat session {}: {}", id, e)))
            })
        })
    }

    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chat_sessions::table.filter(
                    chat_sessions::dsl::id.eq(id).and(chat_sessions::dsl::deleted_at.is_null()),
                ),
            )
            .set((
                chat_sessions::dsl::deleted_at.eq(current_time),
                chat_sessions::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to delete chat session {}: {}", id, e)))
            })
        })
    }

    pub fn get_by_id(id: &str) -> DbResult<Option<ChatSession>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_session_opt = chat_sessions::table
                .filter(chat_sessions::dsl::id.eq(id).and(chat_sessions::dsl::deleted_at.is_null()))
                .select(ChatSessionDb::as_select())
                .first::<ChatSessionDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching chat session {}: {}", id, e)))
                })?;

            Ok(db_session_opt.map(|db_s| db_s.from_db()))
        })
    }

    /// Lists the live sessions owned by one user, newest first.
    pub fn list_by_user(user_id: &str) -> DbResult<Vec<ChatSession>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_sessions = chat_sessions::table
                .filter(
                    chat_sessions::dsl::user_id
                        .eq(user_id)
                        .and(chat_sessions::dsl::deleted_at.is_null()),
                )
                .order(chat_sessions::dsl::created_at.desc())
                .select(ChatSessionDb::as_select())
                .load::<ChatSessionDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to list chat sessions for user {}: {}",
                        user_id, e
                    )))
                })?;

            Ok(db_sessions.into_iter().map(|db_s| db_s.from_db()).collect())
        })
    }

    pub fn list_all() -> DbResult<Vec<ChatSession>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_sessions = chat_sessions::table
                .filter(chat_sessions::dsl::deleted_at.is_null())
                .order(chat_sessions::dsl::created_at.desc())
                .select(ChatSessionDb::as_select())
                .load::<ChatSessionDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to list chat sessions: {}", e)))
                })?;

            Ok(db_sessions.into_iter().map(|db_s| db_s.from_db()).collect())
        })
    }
}
