//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`UserRepository`], [`PictureStore`], [`PasswordHasher`])
//! are implemented by outbound adapters. Driving ports ([`UserRegistration`],
//! [`UsersQuery`]) are consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod password_hasher;
mod picture_store;
mod user_registration;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use picture_store::MockPictureStore;
pub use picture_store::{PictureStore, PictureStoreError};
#[cfg(test)]
pub use user_registration::MockUserRegistration;
pub use user_registration::{RegistrationOutcome, RegistrationRequest, UserRegistration};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::{UserProfile, UsersQuery};
