//! User data model.
//!
//! Identity fields are validated once at construction so services and
//! adapters can rely on well-formed values. Uniqueness is not a property of a
//! single value; it is arbitrated by the user store (see [`UniqueField`]).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Identifier was zero or negative.
    InvalidId,
    /// First name was blank.
    EmptyFirstName,
    /// First name exceeded its length limit.
    FirstNameTooLong {
        /// Maximum characters.
        max: usize,
    },
    /// Email was blank.
    EmptyEmail,
    /// Email exceeded its length limit.
    EmailTooLong {
        /// Maximum characters.
        max: usize,
    },
    /// Email lacked a local part, `@`, or dotted domain.
    InvalidEmail,
    /// Password was empty.
    EmptyPassword,
    /// Password exceeded its length limit.
    PasswordTooLong {
        /// Maximum characters.
        max: usize,
    },
    /// Phone number was shorter than allowed.
    PhoneTooShort {
        /// Minimum characters.
        min: usize,
    },
    /// Phone number was longer than allowed.
    PhoneTooLong {
        /// Maximum characters.
        max: usize,
    },
    /// Phone number contained characters other than digits, spaces, `+`,
    /// `-` and parentheses.
    PhoneInvalidCharacters,
    /// Phone number carried too few digits.
    PhoneTooFewDigits {
        /// Minimum digit count.
        min: usize,
    },
    /// A hasher produced an empty encoding.
    EmptyPasswordHash,
}

impl UserValidationError {
    /// Name of the input field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyFirstName | Self::FirstNameTooLong { .. } => "first_name",
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
            Self::EmptyPassword | Self::PasswordTooLong { .. } | Self::EmptyPasswordHash => {
                "password"
            }
            Self::PhoneTooShort { .. }
            | Self::PhoneTooLong { .. }
            | Self::PhoneInvalidCharacters
            | Self::PhoneTooFewDigits { .. } => "phone",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a positive integer"),
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::FirstNameTooLong { max } => {
                write!(f, "first name must be at most {max} characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like name@example.com"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
            Self::PhoneTooShort { min } => write!(f, "phone must be at least {min} characters"),
            Self::PhoneTooLong { max } => write!(f, "phone must be at most {max} characters"),
            Self::PhoneInvalidCharacters => write!(
                f,
                "phone may only contain digits, spaces, '+', '-', '(' or ')'",
            ),
            Self::PhoneTooFewDigits { min } => {
                write!(f, "phone must contain at least {min} digits")
            }
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned user identifier.
///
/// # Examples
/// ```
/// use profile_registry::domain::UserId;
///
/// let id: UserId = "42".parse().expect("valid id");
/// assert_eq!(id.value(), 42);
/// assert!("0".parse::<UserId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: i64) -> Result<Self, UserValidationError> {
        if id <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Raw numeric identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .parse::<i64>()
            .map_err(|_| UserValidationError::InvalidId)?;
        Self::new(parsed)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a first name.
pub const FIRST_NAME_MAX: usize = 64;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;
/// Maximum allowed length for a plaintext password.
pub const PASSWORD_MAX: usize = 128;
/// Minimum allowed length for a phone number.
pub const PHONE_MIN: usize = 3;
/// Maximum allowed length for a phone number.
pub const PHONE_MAX: usize = 32;
/// Minimum number of digits a phone number must carry.
pub const PHONE_MIN_DIGITS: usize = 3;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        // Length and digit count are enforced separately.
        let pattern = r"^[0-9 +\-()]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

macro_rules! string_value_impls {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = UserValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

/// User first name, unique across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FirstName(String);

impl FirstName {
    /// Validate and construct a [`FirstName`]; surrounding whitespace is
    /// trimmed.
    pub fn new(first_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = first_name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyFirstName);
        }
        if trimmed.chars().count() > FIRST_NAME_MAX {
            return Err(UserValidationError::FirstNameTooLong {
                max: FIRST_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

string_value_impls!(FirstName);

/// Email address normalised to lower case.
///
/// # Examples
/// ```
/// use profile_registry::domain::EmailAddress;
///
/// let email = EmailAddress::new(" Ana@X.com ").expect("valid email");
/// assert_eq!(email.as_ref(), "ana@x.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = email.into();
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

string_value_impls!(EmailAddress);

/// Contact phone number as entered, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and construct a [`PhoneNumber`].
    pub fn new(phone: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = phone.into();
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length < PHONE_MIN {
            return Err(UserValidationError::PhoneTooShort { min: PHONE_MIN });
        }
        if length > PHONE_MAX {
            return Err(UserValidationError::PhoneTooLong { max: PHONE_MAX });
        }
        if !phone_regex().is_match(trimmed) {
            return Err(UserValidationError::PhoneInvalidCharacters);
        }
        if trimmed.chars().filter(char::is_ascii_digit).count() < PHONE_MIN_DIGITS {
            return Err(UserValidationError::PhoneTooFewDigits {
                min: PHONE_MIN_DIGITS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

string_value_impls!(PhoneNumber);

/// Plaintext password supplied at registration.
///
/// Never persisted; the `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Validate and construct a [`Password`]. Whitespace is significant.
    pub fn new(password: impl Into<String>) -> Result<Self, UserValidationError> {
        let plaintext = password.into();
        if plaintext.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        if plaintext.chars().count() > PASSWORD_MAX {
            return Err(UserValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(plaintext))
    }

    /// Borrow the plaintext for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Encoded password hash (PHC string format).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a [`crate::domain::ports::PasswordHasher`].
    pub fn new(encoded: impl Into<String>) -> Result<Self, UserValidationError> {
        let phc = encoded.into();
        if phc.trim().is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(phc))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

/// User fields the store enforces uniqueness on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    /// `first_name`.
    FirstName,
    /// `email`.
    Email,
    /// `phone`.
    Phone,
}

impl UniqueField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User awaiting insertion; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique first name.
    pub first_name: FirstName,
    /// Unique, lower-cased email.
    pub email: EmailAddress,
    /// Unique phone number.
    pub phone: PhoneNumber,
    /// Hash of the registration password.
    pub password_hash: PasswordHash,
}

/// Registered user as exposed to readers. The password hash is not carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    first_name: FirstName,
    email: EmailAddress,
    phone: PhoneNumber,
}

impl User {
    /// Build a new [`User`] from validated parts.
    #[must_use]
    pub const fn new(id: UserId, first_name: FirstName, email: EmailAddress, phone: PhoneNumber) -> Self {
        Self {
            id,
            first_name,
            email,
            phone,
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// First name.
    #[must_use]
    pub const fn first_name(&self) -> &FirstName {
        &self.first_name
    }

    /// Email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Phone number.
    #[must_use]
    pub const fn phone(&self) -> &PhoneNumber {
        &self.phone
    }
}
