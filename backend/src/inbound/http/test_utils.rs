//! Test helpers for inbound HTTP components.

use actix_web::test::TestRequest;

/// Boundary used by [`MultipartBody`].
pub const BOUNDARY: &str = "registry-test-boundary";

/// Minimal `multipart/form-data` body builder for handler tests.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    /// Create an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text part.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Append a file part, with an optional `Content-Type` header.
    pub fn file(mut self, name: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"upload.bin\"\r\n"
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

    /// Close the body and attach it to a `POST` request for `uri`.
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

/// Registration body with every required text part for Ana.
pub fn ana_form() -> MultipartBody {
    MultipartBody::new()
        .text("first_name", "Ana")
        .text("email", "ana@x.com")
        .text("password", "p")
        .text("phone", "555")
}
