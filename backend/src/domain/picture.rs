//! Profile picture data model.
//!
//! A user owns zero or one [`ProfilePicture`]. Picture stores address the
//! stored payload with an opaque [`PictureRef`].

use std::fmt;
use std::sync::OnceLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

/// Media type used when a picture was stored without a content type.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Validation errors for picture values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureValidationError {
    /// The upload carried no bytes.
    Empty,
    /// The upload exceeded the configured size cap.
    TooLarge {
        /// Cap in bytes.
        max: usize,
    },
    /// The declared content type is not `type/subtype[; params]`.
    InvalidContentType,
    /// The declared content type is not `image/*`.
    NotAnImage,
    /// A store returned a blank picture reference.
    EmptyReference,
}

impl fmt::Display for PictureValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "profile picture must not be empty"),
            Self::TooLarge { max } => write!(f, "profile picture must be at most {max} bytes"),
            Self::InvalidContentType => write!(f, "content type must look like type/subtype"),
            Self::NotAnImage => write!(f, "profile picture must have an image/* content type"),
            Self::EmptyReference => write!(f, "picture reference must not be empty"),
        }
    }
}

impl std::error::Error for PictureValidationError {}

static CONTENT_TYPE_RE: OnceLock<Regex> = OnceLock::new();

fn content_type_regex() -> &'static Regex {
    CONTENT_TYPE_RE.get_or_init(|| {
        // type "/" subtype with optional parameters, RFC 6838 token characters.
        let pattern = r"^[A-Za-z0-9!#$&^_.+\-]+/[A-Za-z0-9!#$&^_.+\-]+(\s*;.*)?$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("content type regex failed to compile: {error}"))
    })
}

/// Declared media type of a stored picture, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType(String);

impl ContentType {
    /// Validate and construct a [`ContentType`].
    ///
    /// # Errors
    /// Returns [`PictureValidationError::InvalidContentType`] when the value
    /// is not a media type.
    pub fn new(value: impl Into<String>) -> Result<Self, PictureValidationError> {
        let raw = value.into();
        if !content_type_regex().is_match(&raw) {
            return Err(PictureValidationError::InvalidContentType);
        }
        Ok(Self(raw))
    }

    /// `type/subtype` with any parameters removed.
    ///
    /// # Examples
    /// ```
    /// use profile_registry::domain::ContentType;
    ///
    /// let svg = ContentType::new("image/svg+xml; charset=utf-8").expect("valid type");
    /// assert_eq!(svg.essence(), "image/svg+xml");
    /// ```
    #[must_use]
    pub fn essence(&self) -> &str {
        self.0
            .split_once(';')
            .map_or(self.0.as_str(), |(essence, _)| essence)
            .trim_end()
    }

    /// Whether the top-level type is `image`.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.essence()
            .split_once('/')
            .is_some_and(|(top, _)| top.eq_ignore_ascii_case("image"))
    }
}

impl AsRef<str> for ContentType {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary picture payload with its optional media type.
///
/// # Examples
/// ```
/// use profile_registry::domain::{ContentType, ProfilePicture};
///
/// let content_type = ContentType::new("image/png").expect("valid type");
/// let picture = ProfilePicture::new(vec![1, 2, 3], Some(content_type)).expect("non-empty");
/// assert_eq!(picture.data_uri(), "data:image/png;base64,AQID");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    bytes: Vec<u8>,
    content_type: Option<ContentType>,
}

impl ProfilePicture {
    /// Build a picture.
    ///
    /// # Errors
    /// Returns [`PictureValidationError::Empty`] for an empty payload.
    pub fn new(
        bytes: Vec<u8>,
        content_type: Option<ContentType>,
    ) -> Result<Self, PictureValidationError> {
        if bytes.is_empty() {
            return Err(PictureValidationError::Empty);
        }
        Ok(Self {
            bytes,
            content_type,
        })
    }

    /// Raw payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared media type, if one was recorded.
    #[must_use]
    pub const fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// `Content-Type` header value for downloads: the declared type verbatim,
    /// or [`FALLBACK_CONTENT_TYPE`].
    #[must_use]
    pub fn media_type(&self) -> &str {
        self.content_type
            .as_ref()
            .map_or(FALLBACK_CONTENT_TYPE, AsRef::as_ref)
    }

    /// Inline `data:<type/subtype>;base64,<payload>` representation.
    ///
    /// Media type parameters are dropped; a data URI may not contain the
    /// whitespace they often carry.
    #[must_use]
    pub fn data_uri(&self) -> String {
        let essence = self
            .content_type
            .as_ref()
            .map_or(FALLBACK_CONTENT_TYPE, ContentType::essence);
        format!("data:{essence};base64,{}", STANDARD.encode(&self.bytes))
    }

    /// Consume the picture, returning its payload and content type.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Option<ContentType>) {
        (self.bytes, self.content_type)
    }
}

/// Opaque store-issued reference to a stored picture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PictureRef(String);

impl PictureRef {
    /// Wrap a store-issued reference.
    ///
    /// # Errors
    /// Returns [`PictureValidationError::EmptyReference`] for a blank value.
    pub fn new(value: impl Into<String>) -> Result<Self, PictureValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PictureValidationError::EmptyReference);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for PictureRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PictureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PictureRef> for String {
    fn from(value: PictureRef) -> Self {
        value.0
    }
}
