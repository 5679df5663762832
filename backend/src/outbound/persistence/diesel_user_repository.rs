//! PostgreSQL-backed `UserRepository` using Diesel.
//!
//! Uniqueness of first name, email and phone is enforced by the `users`
//! table's unique constraints. [`UserRepository::find_conflict`] is a
//! fast path only; the insert maps a constraint violation to
//! [`UserRepositoryError::Duplicate`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    EmailAddress, FirstName, NewUser, PhoneNumber, UniqueField, User, UserId,
    UserValidationError,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation_field};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Serve user rows from `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn insert_error(error: diesel::result::Error) -> UserRepositoryError {
    unique_violation_field(&error).map_or_else(|| diesel_error(error), UserRepositoryError::duplicate)
}

fn corrupt_row(id: i64, error: &UserValidationError) -> UserRepositoryError {
    UserRepositoryError::query(format!("stored user {id} is invalid: {error}"))
}

impl UserRow {
    fn into_user(self) -> Result<User, UserRepositoryError> {
        let id = self.id;
        let convert = || -> Result<User, UserValidationError> {
            Ok(User::new(
                UserId::new(self.id)?,
                FirstName::new(self.first_name)?,
                EmailAddress::new(self.email)?,
                PhoneNumber::new(self.phone)?,
            ))
        };
        convert().map_err(|err| corrupt_row(id, &err))
    }
}

/// Pick the reported field when several identity columns collide.
fn first_conflict(candidate: &NewUser, rows: &[(String, String, String)]) -> Option<UniqueField> {
    let email = candidate.email.as_ref();
    let phone = candidate.phone.as_ref();
    let first_name = candidate.first_name.as_ref();

    if rows.iter().any(|(row_email, _, _)| row_email == email) {
        Some(UniqueField::Email)
    } else if rows.iter().any(|(_, row_phone, _)| row_phone == phone) {
        Some(UniqueField::Phone)
    } else if rows.iter().any(|(_, _, row_name)| row_name == first_name) {
        Some(UniqueField::FirstName)
    } else {
        None
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_conflict(
        &self,
        candidate: &NewUser,
    ) -> Result<Option<UniqueField>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        // Each column is unique, so at most three rows can match.
        let rows: Vec<(String, String, String)> = users::table
            .filter(
                users::email
                    .eq(candidate.email.as_ref())
                    .or(users::phone.eq(candidate.phone.as_ref()))
                    .or(users::first_name.eq(candidate.first_name.as_ref())),
            )
            .select((users::email, users::phone, users::first_name))
            .limit(3)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(first_conflict(candidate, &rows))
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewUserRow {
            first_name: user.first_name.as_ref(),
            email: user.email.as_ref(),
            phone: user.phone.as_ref(),
            password_hash: user.password_hash.as_ref(),
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(insert_error)?;

        inserted.into_user()
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(id.value())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.value()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn existing_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let found: Vec<i64> = users::table
            .filter(users::id.eq_any(raw))
            .select(users::id)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        found
            .into_iter()
            .map(|id| UserId::new(id).map_err(|err| corrupt_row(id, &err)))
            .collect()
    }
}
