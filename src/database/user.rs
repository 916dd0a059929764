use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use crate::controller::BaseError;
use crate::database::{get_connection, DbResult};
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, AsChangeset)]
    #[diesel(table_name = users)]
    pub struct User {
        pub id: String,
        pub email: String,
        pub name: String,
        pub password_hash: Option<String>,
        pub user_type: String,
        pub status: String,
        pub last_login: Option<i64>,
        pub deleted_at: Option<i64>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Deserialize, Debug)]
    #[diesel(table_name = users)]
    pub struct NewUser {
        pub id: String,
        pub email: String,
        pub name: String,
        pub password_hash: Option<String>,
        pub user_type: String,
        pub status: String,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug)]
    #[diesel(table_name = users)]
    pub struct UpdateUserData {
        pub email: Option<String>,
        pub name: Option<String>,
        pub password_hash: Option<String>,
        pub user_type: Option<String>,
        pub status: Option<String>,
        pub last_login: Option<i64>,
    }
}

impl User {
    /// Inserts a new user row and returns it as stored.
    pub fn create(new_user: &NewUser) -> DbResult<User> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user = diesel::insert_into(users::table)
                .values(NewUserDb::to_db(new_user))
                .returning(UserDb::as_returning())
                .get_result::<UserDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to insert user: {}", e))))?;
            Ok(db_user.from_db())
        })
    }

    /// Applies a partial update to a live user. Returns the number of rows
    /// touched, zero when the id does not name a live row.
    pub fn update(id: &str, update_data: &UpdateUserData) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                users::table.filter(users::dsl::id.eq(id).and(users::dsl::deleted_at.is_null())),
            )
            .set((
                UpdateUserDataDb::to_db(update_data),
                users::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to update user {}: {}", id, e))))
        })
    }

    /// Soft deletes a user by stamping `deleted_at`.
    pub fn delete(id: &str) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(
                users::table.filter(users::dsl::id.eq(id).and(users::dsl::deleted_at.is_null())),
            )
            .set((
                users::dsl::deleted_at.eq(current_time),
                users::dsl::updated_at.eq(current_time),
            ))
            .execute(conn)
            .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to delete user {}: {}", id, e))))
        })
    }

    pub fn get_by_id(id: &str) -> DbResult<Option<User>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user_opt = users::table
                .filter(users::dsl::id.eq(id).and(users::dsl::deleted_at.is_null()))
                .select(UserDb::as_select())
                .first::<UserDb>(conn)
                .optional()
                .map_err(|e|BaseError::DatabaseFatal(Some(format!("Error fetching user {}: {}", id, e))))?;

            Ok(db_user_opt.map(|db_u| db_u.from_db()))
        })
    }

    /// Lists all live users, newest first.
    pub fn list_all() -> DbResult<Vec<User>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_users = users::table
                .filter(users::dsl::deleted_at.is_null())
                .order(users::dsl::created_at.desc())
                .select(UserDb::as_select())
                .load::<UserDb>(conn)
                .map_err(|e| BaseError::DatabaseFatal(Some(format!("Failed to list users: {}", e))))?;

            Ok(db_users.into_iter().map(|db_u| db_u.from_db()).collect())
        })
    }
}
