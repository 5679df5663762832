//! Shared helpers for HTTP integration tests.
//!
//! The registry is exercised end to end through [`build_app`] with in-memory
//! stores that honour the same contract as the PostgreSQL and MongoDB
//! adapters: the user store arbitrates uniqueness on insert and the picture
//! store keeps at most one picture per user.

#![expect(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test::{self, TestRequest};
use actix_web::web;
use async_trait::async_trait;
use tokio::sync::Barrier;

use profile_registry::domain::ports::{
    PasswordHashError, PasswordHasher, PictureStore, PictureStoreError, UserRepository,
    UserRepositoryError,
};
use profile_registry::domain::{
    NewUser, Password, PasswordHash, PictureRef, ProfilePicture, RetryPolicy, StorageRetry,
    UniqueField, User, UserId,
};
use profile_registry::inbound::http::health::HealthState;
use profile_registry::inbound::http::state::UploadLimits;
use profile_registry::server::{StoragePorts, build_app, build_http_state};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<i64, NewUser>,
}

impl UserTable {
    fn collision(&self, candidate: &NewUser) -> Option<UniqueField> {
        let rows = || self.rows.values();
        if rows().any(|row| row.email == candidate.email) {
            Some(UniqueField::Email)
        } else if rows().any(|row| row.phone == candidate.phone) {
            Some(UniqueField::Phone)
        } else if rows().any(|row| row.first_name == candidate.first_name) {
            Some(UniqueField::FirstName)
        } else {
            None
        }
    }
}

fn to_user(id: i64, row: &NewUser) -> Result<User, UserRepositoryError> {
    let id = UserId::new(id).map_err(|err| UserRepositoryError::query(err.to_string()))?;
    Ok(User::new(
        id,
        row.first_name.clone(),
        row.email.clone(),
        row.phone.clone(),
    ))
}

/// User store enforcing uniqueness atomically on insert.
#[derive(Default)]
pub struct InMemoryUsers {
    table: Mutex<UserTable>,
    conflict_gate: Option<Arc<Barrier>>,
    fail_deletes: AtomicBool,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every `find_conflict` call until `parties` callers arrive, so
    /// concurrent registrations all pass the pre-check before inserting.
    pub fn with_conflict_gate(parties: usize) -> Self {
        Self {
            conflict_gate: Some(Arc::new(Barrier::new(parties))),
            ..Self::default()
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.table).rows.len()
    }

    /// Insert a row directly, bypassing the registration flow.
    pub fn seed(&self, user: NewUser) -> UserId {
        let mut table = lock(&self.table);
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(id, user);
        UserId::new(id).expect("generated ids are positive")
    }

    pub fn remove(&self, id: UserId) {
        lock(&self.table).rows.remove(&id.value());
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_conflict(
        &self,
        candidate: &NewUser,
    ) -> Result<Option<UniqueField>, UserRepositoryError> {
        if let Some(gate) = &self.conflict_gate {
            gate.wait().await;
        }
        Ok(lock(&self.table).collision(candidate))
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut table = lock(&self.table);
        if let Some(field) = table.collision(user) {
            return Err(UserRepositoryError::duplicate(field));
        }
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(id, user.clone());
        to_user(id, user)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(UserRepositoryError::connection("users store offline"));
        }
        Ok(lock(&self.table).rows.remove(&id.value()).is_some())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let table = lock(&self.table);
        table
            .rows
            .get(&id.value())
            .map(|row| to_user(id.value(), row))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let table = lock(&self.table);
        table
            .rows
            .iter()
            .map(|(id, row)| to_user(*id, row))
            .collect()
    }

    async fn existing_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserRepositoryError> {
        let table = lock(&self.table);
        Ok(ids
            .iter()
            .copied()
            .filter(|id| table.rows.contains_key(&id.value()))
            .collect())
    }
}

/// Picture store keyed by owner, with an injectable write outage.
#[derive(Default)]
pub struct InMemoryPictures {
    rows: Mutex<BTreeMap<i64, ProfilePicture>>,
    fail_puts: AtomicBool,
}

impl InMemoryPictures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn contains(&self, owner: UserId) -> bool {
        lock(&self.rows).contains_key(&owner.value())
    }

    /// Store a picture directly, e.g. to simulate a late write.
    pub fn seed(&self, owner: UserId, picture: ProfilePicture) {
        lock(&self.rows).insert(owner.value(), picture);
    }
}

#[async_trait]
impl PictureStore for InMemoryPictures {
    async fn put(
        &self,
        user_id: &UserId,
        picture: &ProfilePicture,
    ) -> Result<PictureRef, PictureStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(PictureStoreError::connection("picture store offline"));
        }
        lock(&self.rows).insert(user_id.value(), picture.clone());
        PictureRef::new(format!("pic-{user_id}"))
            .map_err(|err| PictureStoreError::query(err.to_string()))
    }

    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePicture>, PictureStoreError> {
        Ok(lock(&self.rows).get(&user_id.value()).cloned())
    }

    async fn get_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ProfilePicture>, PictureStoreError> {
        let rows = lock(&self.rows);
        Ok(user_ids
            .iter()
            .filter_map(|id| rows.get(&id.value()).map(|picture| (*id, picture.clone())))
            .collect())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, PictureStoreError> {
        Ok(lock(&self.rows).remove(&user_id.value()).is_some())
    }

    async fn owner_ids(&self) -> Result<Vec<UserId>, PictureStoreError> {
        lock(&self.rows)
            .keys()
            .map(|id| UserId::new(*id).map_err(|err| PictureStoreError::query(err.to_string())))
            .collect()
    }
}

/// Reversible stand-in for Argon2 so tests stay fast.
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        PasswordHash::new(format!("plain${}", password.expose()))
            .map_err(|err| PasswordHashError::hashing(err.to_string()))
    }
}

/// Retry policy with millisecond backoff so outage tests finish quickly.
pub fn fast_retry() -> StorageRetry {
    StorageRetry::new(RetryPolicy {
        attempt_timeout: Duration::from_secs(2),
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    })
}

/// In-memory stores shared between the app under test and assertions.
pub struct Stores {
    pub users: Arc<InMemoryUsers>,
    pub pictures: Arc<InMemoryPictures>,
}

impl Stores {
    pub fn new(users: InMemoryUsers) -> Self {
        Self {
            users: Arc::new(users),
            pictures: Arc::new(InMemoryPictures::new()),
        }
    }

    pub fn ports(&self) -> StoragePorts {
        StoragePorts {
            users: Arc::clone(&self.users) as Arc<dyn UserRepository>,
            pictures: Arc::clone(&self.pictures) as Arc<dyn PictureStore>,
            hasher: Arc::new(PlainHasher),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new(InMemoryUsers::new())
    }
}

/// Initialise the full application over `stores`.
pub async fn init_app(
    stores: &Stores,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = build_http_state(&stores.ports(), &fast_retry(), UploadLimits::default());
    test::init_service(build_app(
        web::Data::new(HealthState::new()),
        web::Data::new(state),
    ))
    .await
}

/// Boundary used by [`MultipartBody`].
pub const BOUNDARY: &str = "registry-it-boundary";

/// Minimal `multipart/form-data` body builder.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"avatar\"\r\n"
            )
            .as_bytes(),
        );
        if let Some(content_type) = content_type {
            self.body
                .extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> TestRequest {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        TestRequest::post()
            .uri(uri)
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(self.body)
    }
}

/// Smallest byte sequence carrying the PNG signature.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x01];

/// Registration form with a PNG picture.
pub fn registration(first_name: &str, email: &str, phone: &str) -> MultipartBody {
    MultipartBody::new()
        .text("first_name", first_name)
        .text("email", email)
        .text("password", "p")
        .text("phone", phone)
        .file("profile_picture", Some("image/png"), PNG_BYTES)
}

/// Ana's registration from the service documentation.
pub fn ana_form() -> MultipartBody {
    registration("Ana", "ana@x.com", "555")
}
