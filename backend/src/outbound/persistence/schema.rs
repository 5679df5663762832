//! Diesel table definitions.
//!
//! Must match `backend/migrations`; regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Registered users. `first_name`, `email` and `phone` are each unique.
    users (id) {
        id -> Int8,
        first_name -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// At most one picture per user; rows cascade with their owner.
    profile_pictures (id) {
        id -> Int8,
        user_id -> Int8,
        profile_picture -> Bytea,
        content_type -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(profile_pictures -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(users, profile_pictures);
