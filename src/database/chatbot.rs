use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::schema::enum_def::ProviderKind;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = chatbots)]
    pub struct Chatbot {
        pub id: String,
        pub name: String,
        pub model: String,
        pub provider: ProviderKind,
        pub daily_limit: i32,
        pub max_tokens: i32,
        pub has_file_access: bool,
        pub system_prompt: String,
        pub welcome_message: Option<String>,
        pub knowledge_base: Option<String>,
        pub knowledge_base_enabled: bool,
        pub response_language: String,
        pub temperature: f64,
        pub emoji_mode: bool,
        pub role: String,
        pub principles: String,
        pub interaction_examples: String,
        pub status: String,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = chatbots)]
    pub struct NewChatbot {
        pub id: String,
        pub name: String,
        pub model: String,
        pub provider: ProviderKind,
        pub daily_limit: i32,
        pub max_tokens: i32,
        pub has_file_access: bool,
        pub system_prompt: String,
        pub welcome_message: Option<String>,
        pub knowledge_base: Option<String>,
        pub knowledge_base_enabled: bool,
        pub response_language: String,
        pub temperature: f64,
        pub emoji_mode: bool,
        pub role: String,
        pub principles: String,
        pub interaction_examples: String,
        pub status: String,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = chatbots)]
    pub struct UpdateChatbotData {
        pub name: Option<String>,
        pub model: Option<String>,
        pub provider: Option<ProviderKind>,
        pub daily_limit: Option<i32>,
        pub max_tokens: Option<i32>,
        pub has_file_access: Option<bool>,
        pub system_prompt: Option<String>,
        pub welcome_message: Option<String>,
        pub knowledge_base: Option<Option<String>>,
        pub knowledge_base_enabled: Option<bool>,
        pub response_language: Option<String>,
        pub temperature: Option<f64>,
        pub emoji_mode: Option<bool>,
        pub role: Option<String>,
        pub principles: Option<String>,
        pub interaction_examples: Option<String>,
        pub status: Option<String>,
    }
}

impl Chatbot {
    /// Inserts a new chatbot row and returns it as stored.
    pub fn create(new_chatbot: &NewChatbot) -> DbResult<Chatbot> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_chatbot = diesel::insert_into(chatbots::table)
                .values(NewChatbotDb::to_db(new_chatbot))
                .returning(ChatbotDb::as_returning())
                .get_result::<ChatbotDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to insert chatbot: {}", e))))?;
            Ok(db_chatbot.from_db())
        })
    }

    /// Applies a partial update to a live chatbot. `knowledge_base` takes a
    /// nested option so a disabled knowledge base can clear the column.
    pub fn update(id: &str, update_data: &UpdateChatbotData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chatbots::table
                    .filter(chatbots::dsl::id.eq(id).and(chatbots::dsl::deleted_at.is_null())),
            )
            .set((
                UpdateChatbotDataDb::to_db(update_data),
                chatbots::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to update chatbot {}: {}", id, e))))
        })
    }

    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                chatbots::table
                    .filter(chatbots::dsl::id.eq(id).and(chatbots::dsl::deleted_at.is_null())),
            )
            .set((
                chatbots::dsl::deleted_at.eq(current_time),
                chatbots::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to delete chatbot {}: {}", id, e))))
        })
    }

    pub fn get_by_id(id: &str) -> DbResult<Option<Chatbot>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_chatbot_opt = chatbots::table
                .filter(chatbots::dsl::id.eq(id).and(chatbots::dsl::deleted_at.is_null()))
                .select(ChatbotDb::as_select())
                .first::<ChatbotDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching chatbot {}: {}", id, e)))
                })?;

            Ok(db_chatbot_opt.map(|db_c| db_c.from_db()))
        })
    }

    pub fn list_all() -> DbResult<Vec<Chatbot>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_chatbots = chatbots::table
                .filter(chatbots::dsl::deleted_at.is_null())
                .order(chatbots::dsl::created_at.desc())
                .select(ChatbotDb::as_select())
                .load::<ChatbotDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to list chatbots: {}", e))))?;

            Ok(db_chatbots.into_iter().map(|db_c| db_c.from_db()).collect())
        })
    }
}
