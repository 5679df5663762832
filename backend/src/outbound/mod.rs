//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL users and relational pictures via Diesel
//! - **document**: MongoDB pictures
//! - **crypto**: Argon2id password hashing
//!
//! Adapters translate between domain values and storage representations and
//! classify failures; they hold no business rules.

pub mod crypto;
pub mod document;
pub mod persistence;
