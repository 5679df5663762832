//! Internal Diesel row structs.
//!
//! These never leave the persistence layer; repositories convert them into
//! domain values.

use diesel::prelude::*;

use super::schema::{profile_pictures, users};

/// Row read from `users`. The password hash is never selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub first_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
}

/// Row read from `profile_pictures`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profile_pictures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PictureRow {
    pub user_id: i64,
    pub profile_picture: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profile_pictures)]
pub(crate) struct NewPictureRow<'a> {
    pub user_id: i64,
    pub profile_picture: &'a [u8],
    pub content_type: Option<&'a str>,
}
