//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it, or return anything
//! that implements [`IntoResponse`]: strings, status codes, [`Json`], [`Xml`],
//! errors, or a `Result` of any of these.

use std::path::Path;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue, IntoHeaderName};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }

    /// Content type for a file, from its extension.
    pub fn for_path(path: &Path) -> &'static str {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("html" | "htm") => Self::Html.as_str(),
            Some("txt" | "md")   => Self::Text.as_str(),
            Some("json")         => Self::Json.as_str(),
            Some("xml")          => Self::Xml.as_str(),
            Some("css")          => "text/css",
            Some("csv")          => "text/csv",
            Some("js" | "mjs")   => "application/javascript",
            Some("png")          => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif")          => "image/gif",
            Some("svg")          => "image/svg+xml",
            Some("pdf")          => "application/pdf",
            Some("zip")          => "application/zip",
            _                    => Self::OctetStream.as_str(),
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use senda::Response;
/// use http::StatusCode;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use senda::{ContentType, Response};
/// use http::{HeaderValue, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    /// `200 OK` with the contents of `path`, content type taken from its
    /// extension.
    pub async fn file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let body = tokio::fs::read(path).await?;
        Ok(Self::builder().finish(ContentType::for_path(path), body))
    }

    /// Like [`file`](Self::file), but asks the client to save the body as
    /// `filename` (`Content-Disposition: attachment`).
    pub async fn download(path: impl AsRef<Path>, filename: &str) -> Result<Self, Error> {
        let mut res = Self::file(path).await?;
        res.headers.insert(header::CONTENT_DISPOSITION, attachment(filename)?);
        Ok(res)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Drops the body but keeps its length in `content-length`, as a `HEAD`
    /// answer to the equivalent `GET` must.
    pub(crate) fn strip_body(mut self) -> Self {
        self.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        self.body = Bytes::new();
        self
    }

    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

/// `attachment; filename="<name>"`, with quotes and backslashes escaped and
/// control characters dropped.
fn attachment(filename: &str) -> Result<HeaderValue, Error> {
    let mut escaped = String::with_capacity(filename.len());
    for c in filename.chars().filter(|c| !c.is_control()) {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e).into())
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
#[derive(Debug)]
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(ContentType::Json.as_str(), body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.finish(ContentType::Text.as_str(), body)
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, etc.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), body)
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(mut self, content_type: &'static str, body: impl Into<Bytes>) -> Response {
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Response { body: body.into(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Errors answer with their status and their message as plain text.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        Response::builder().status(status).text(self.to_string())
    }
}

/// A value serialized as the JSON response body.
///
/// Map keys come out in sorted order:
///
/// ```rust
/// use senda::{IntoResponse, Json};
///
/// let res = Json(serde_json::json!({ "username": "Lev", "name": "Lev Tempest" })).into_response();
/// assert_eq!(&res.body()[..], br#"{"name":"Lev Tempest","username":"Lev"}"#);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "json response serialization failed");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// A value serialized as the XML response body, rooted at the type's name.
#[derive(Clone, Copy, Debug)]
pub struct Xml<T>(pub T);

impl<T: Serialize> IntoResponse for Xml<T> {
    fn into_response(self) -> Response {
        match quick_xml::se::to_string(&self.0) {
            Ok(body) => Response::builder().bytes(ContentType::Xml, body),
            Err(e) => {
                tracing::warn!(error = %e, "xml response serialization failed");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn text_and_status_shortcuts() {
        let res = Response::text("hi");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(&res.body()[..], b"hi");

        let res = StatusCode::NO_CONTENT.into_response();
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn json_keys_are_sorted() {
        let res = Json(serde_json::json!({ "username": "Lev", "name": "Lev Tempest" })).into_response();
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(&res.body()[..], br#"{"name":"Lev Tempest","username":"Lev"}"#);
    }

    #[test]
    fn xml_body() {
        #[derive(Serialize)]
        struct User {
            name: String,
        }
        let res = Xml(User { name: "Lev".into() }).into_response();
        assert_eq!(res.header("content-type"), Some("application/xml"));
        assert_eq!(&res.body()[..], b"<User><name>Lev</name></User>");
    }

    #[test]
    fn errors_become_status_and_message() {
        let res: Response = Err::<String, _>(Error::MissingFormFile("file".into())).into_response();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(&res.body()[..], b"there is no uploaded file associated with the key `file`");
    }

    #[test]
    fn builder_keeps_extra_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", HeaderValue::from_static("/users/42"))
            .json(r#"{"id":42}"#);
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("location"), Some("/users/42"));
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn attachment_header_escapes_quotes() {
        assert_eq!(attachment("contoh-downloaded.txt").unwrap(), "attachment; filename=\"contoh-downloaded.txt\"");
        assert_eq!(attachment("a\"b\n.txt").unwrap(), "attachment; filename=\"a\\\"b.txt\"");
    }

    #[test]
    fn strip_body_keeps_length() {
        let res = Response::text("Hello, World!").strip_body();
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-length"), Some("13"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = Response::file("/definitely/not/here.txt").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(ContentType::for_path(Path::new("a/contoh.txt")), "text/plain; charset=utf-8");
        assert_eq!(ContentType::for_path(Path::new("x.PNG")), "image/png");
        assert_eq!(ContentType::for_path(Path::new("blob")), "application/octet-stream");
    }
}
