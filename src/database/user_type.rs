use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = user_types)]
    pub struct UserType {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub accessible_pages: String,
        pub is_enabled: bool,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = user_types)]
    pub struct NewUserType {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub accessible_pages: String,
        pub is_enabled: bool,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = user_types)]
    pub struct UpdateUserTypeData {
        pub name: Option<String>,
        pub description: Option<String>,
        pub accessible_pages: Option<String>,
        pub is_enabled: Option<bool>,
    }
}

impl UserType {
    pub fn create(new_user_type: &NewUserType) -> DbResult<UserType> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user_type = diesel::insert_into(user_types::table)
                .values(NewUserTypeDb::to_db(new_user_type))
                .returning(UserTypeDb::as_returning())
                .get_result::<UserTypeDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to insert user type: {}", e))))?;
            Ok(db_user_type.from_db())
        })
    }

    pub fn update(id: &str, update_data: &UpdateUserTypeData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                user_types::table
                    .filter(user_types::dsl::id.eq(id).and(user_types::dsl::deleted_at.is_null())),
            )
            .set((
                UpdateUserTypeDataDb::to_db(update_data),
                user_types::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to update user type {}: {}", id, e)))
            })
        })
    }

    /// Soft deletes a user type and disables it in the same stroke.
    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                user_types::table
                    .filter(user_types::dsl::id.eq(id).and(user_types::dsl::deleted_at.is_null())),
            )
            .set((
                user_types::dsl::deleted_at.eq(current_time),
                user_types::dsl::is_enabled.eq(false),
                user_types::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!("Failed to delete user type {}: {}", id, e)))
            })
        })
    }

    pub fn get_by_id(id: &str) -> DbResult<Option<UserType>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user_type_opt = user_types::table
                .filter(user_types::dsl::id.eq(id).and(user_types::dsl::deleted_at.is_null()))
                .select(UserTypeDb::as_select())
                .first::<UserTypeDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching user type {}: {}", id, e)))
                })?;

            Ok(db_user_type_opt.map(|db_t| db_t.from_db()))
        })
    }

    pub fn list_all() -> DbResult<Vec<UserType>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user_types = user_types::table
                .filter(user_types::dsl::deleted_at.is_null())
                .order(user_types::dsl::created_at.desc())
                .select(UserTypeDb::as_select())
                .load::<UserTypeDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to list user types: {}", e))))?;

            Ok(db_user_types.into_iter().map(|db_t| db_t.from_db()).collect())
        })
    }
}
