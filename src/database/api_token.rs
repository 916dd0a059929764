use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::schema::enum_def::ProviderKind;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = api_tokens)]
    pub struct ApiToken {
        pub id: String,
        pub name: String,
        pub value: String,
        pub provider: ProviderKind,
        pub is_active: bool,
        pub user_id: Option<String>,
        pub usage_count: i64,
        pub last_used_at: Option<i64>,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = api_tokens)]
    pub struct NewApiToken {
        pub id: String,
        pub name: String,
        pub value: String,
        pub provider: ProviderKind,
        pub is_active: bool,
        pub user_id: Option<String>,
        pub usage_count: i64,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = api_tokens)]
    pub struct UpdateApiTokenData {
        pub name: Option<String>,
        pub value: Option<String>,
        pub provider: Option<ProviderKind>,
        pub is_active: Option<bool>,
        pub user_id: Option<String>,
    }
}

impl ApiToken {
    /// Inserts a new token. Creating it active demotes the provider's other
    /// tokens inside the same transaction, so at most one token per provider
    /// ever carries the active flag.
    pub fn create(new_token: &NewApiToken) -> DbResult<ApiToken> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_token = conn
                .transaction::<_, diesel::result::Error, _>(|conn| {
                    if new_token.is_active {
                        diesel::update(
                            api_tokens::table.filter(
                                api_tokens::dsl::provider
                                    .eq(&new_token.provider)
                                    .and(api_tokens::dsl::deleted_at.is_null()),
                            ),
                        )
                        .set(api_tokens::dsl::is_active.eq(false))
                        .execute(conn)?;
                    }
                    diesel::insert_into(api_tokens::table)
                        .values(NewApiTokenDb::to_db(new_token))
                        .returning(ApiTokenDb::as_returning())
                        .get_result::<ApiTokenDb>(conn)
                })
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to insert API token: {}", e))))?;
            Ok(db_token.from_db())
        })
    }

    /// Applies a partial update to a live token. Activating a token demotes
    /// its provider siblings in the same transaction. Returns the number of
    /// rows touched, zero when the id does not name a live row.
    pub fn update(id: &str, update_data: &UpdateApiTokenData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                if update_data.is_active == Some(true) {
                    let existing_provider = api_tokens::table
                        .filter(api_tokens::dsl::id.eq(id).and(api_tokens::dsl::deleted_at.is_null()))
                        .select(api_tokens::dsl::provider)
                        .first::<ProviderKind>(conn)
                        .optional()?;

                    let Some(existing_provider) = existing_provider else {
                        return Ok(0);
                    };
                    let target_provider = update_data.provider.clone().unwrap_or(existing_provider);

                    diesel::update(
                        api_tokens::table.filter(
                            api_tokens::dsl::provider
                                .eq(&target_provider)
                                .and(api_tokens::dsl::id.ne(id))
                                .and(api_tokens::dsl::deleted_at.is_null()),
                        ),
                    )
                    .set(api_tokens::dsl::is_active.eq(false))
                    .execute(conn)?;
                }

                diesel::update(
                    api_tokens::table
                        .filter(api_tokens::dsl::id.eq(id).and(api_tokens::dsl::deleted_at.is_null())),
                )
                .set((
                    UpdateApiTokenDataDb::to_db(update_data),
                    api_tokens::dsl::updated_at.eq(current_time),
                ))
                .execute(conn)
            })
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to update API token {}: {}", id, e))))
        })
    }

    /// Soft deletes a token and drops its active flag.
    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                api_tokens::table
                    .filter(api_tokens::dsl::id.eq(id).and(api_tokens::dsl::deleted_at.is_null())),
            )
            .set((
                api_tokens::dsl::deleted_at.eq(current_time),
                api_tokens::dsl::is_active.eq(false),
                api_tokens::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to delete API token {}: {}", id, e))))
        })
    }

    pub fn get_by_id(id: &str) -> DbResult<Option<ApiToken>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_token_opt = api_tokens::table
                .filter(api_tokens::dsl::id.eq(id).and(api_tokens::dsl::deleted_at.is_null()))
                .select(ApiTokenDb::as_select())
                .first::<ApiTokenDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching API token {}: {}", id, e)))
                })?;

            Ok(db_token_opt.map(|db_t| db_t.from_db()))
        })
    }

    /// The credential the completion adapter runs on: the single live, active
    /// token of a provider.
    pub fn get_active_by_provider(provider: &ProviderKind) -> DbResult<Option<ApiToken>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_token_opt = api_tokens::table
                .filter(
                    api_tokens::dsl::provider
                        .eq(provider)
                        .and(api_tokens::dsl::is_active.eq(true))
                        .and(api_tokens::dsl::deleted_at.is_null()),
                )
                .select(ApiTokenDb::as_select())
                .first::<ApiTokenDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Error fetching active token for provider {}: {}",
                        provider, e
                    )))
                })?;

            Ok(db_token_opt.map(|db_t| db_t.from_db()))
        })
    }

    /// Bumps the usage counter and stamps `last_used_at` after a completion.
    pub fn record_usage(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                api_tokens::table
                    .filter(api_tokens::dsl::id.eq(id).and(api_tokens::dsl::deleted_at.is_null())),
            )
            .set((
                api_tokens::dsl::usage_count.eq(api_tokens::dsl::usage_count + 1),
                api_tokens::dsl::last_used_at.eq(current_time),
                api_tokens::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to record usage for token {}: {}", id, e)))
            })
        })
    }

    pub fn list_all() -> DbResult<Vec<ApiToken>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_tokens = api_tokens::table
                .filter(api_tokens::dsl::deleted_at.is_null())
                .order(api_tokens::dsl::created_at.desc())
                .select(ApiTokenDb::as_select())
                .load::<ApiTokenDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to list API tokens: {}", e))))?;

            Ok(db_tokens.into_iter().map(|db_t| db_t.from_db()).collect())
        })
    }
}
