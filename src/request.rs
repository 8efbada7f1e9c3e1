//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::decode::{self, BodyKind};
use crate::error::{DecodeError, Error};
use crate::multipart::{FormFile, Multipart};

/// An incoming HTTP request: everything a handler can read.
///
/// Owned by exactly one handler invocation and dropped once the response is
/// written.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    query: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    extensions: Extensions,
}

impl Request {
    pub(crate) fn new(parts: http::request::Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        let query = parts
            .uri
            .query()
            .map(|q| {
                serde_urlencoded::from_str(q).unwrap_or_else(|e| {
                    tracing::debug!(query = q, error = %e, "ignoring undecodable query string");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        let cookies = parse_cookies(&parts.headers);

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params,
            query,
            cookies,
            extensions: parts.extensions,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First percent-decoded query value for `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    /// Like [`query`](Self::query), with a fallback when the key is missing
    /// or its value is empty (`?name=`).
    pub fn query_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.query(key).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    /// Decodes the whole query string into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let q = self.uri.query().unwrap_or_default();
        serde_urlencoded::from_str(q).map_err(|e| Error::Decode(e.into()))
    }

    /// A clone of the router state of type `S`, if one was registered with
    /// [`Router::with_state`](crate::Router::with_state).
    pub fn state<S: Clone + Send + Sync + 'static>(&self) -> Option<S> {
        self.extensions.get::<S>().cloned()
    }

    /// Returns the value of cookie `name`, if the client sent it.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        lookup(&self.cookies, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Decodes the body into `T`, picking JSON, XML, form or multipart
    /// decoding from the `Content-Type` header.
    pub async fn parse_body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(decode::decode(self.content_type(), self.body.clone()).await?)
    }

    /// Decodes the body as JSON regardless of `Content-Type`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.into()))
    }

    /// Parses a `multipart/form-data` body.
    pub async fn multipart(&self) -> Result<Multipart, Error> {
        match self.body_kind()? {
            BodyKind::Multipart { boundary } => Ok(Multipart::parse(&boundary, self.body.clone()).await?),
            _ => Err(self.unsupported().into()),
        }
    }

    /// Reads a single form field from either a URL-encoded or multipart body.
    ///
    /// Any other body yields `Ok(None)`, the same as a missing field.
    pub async fn form_value(&self, name: &str) -> Result<Option<String>, Error> {
        match self.body_kind() {
            Ok(BodyKind::Form) => {
                let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body).map_err(DecodeError::from)?;
                Ok(lookup(&pairs, name).map(str::to_owned))
            }
            Ok(BodyKind::Multipart { boundary }) => {
                let form = Multipart::parse(&boundary, self.body.clone()).await?;
                Ok(form.value(name).map(str::to_owned))
            }
            _ => Ok(None),
        }
    }

    /// Returns the first file uploaded under the multipart field `name`.
    pub async fn form_file(&self, name: &str) -> Result<FormFile, Error> {
        self.multipart()
            .await?
            .take_file(name)
            .ok_or_else(|| Error::MissingFormFile(name.to_owned()))
    }

    fn body_kind(&self) -> Result<BodyKind, DecodeError> {
        BodyKind::from_content_type(self.content_type().ok_or(DecodeError::MissingContentType)?)
    }

    fn unsupported(&self) -> DecodeError {
        DecodeError::UnsupportedContentType(self.content_type().unwrap_or_default().to_owned())
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Collects `name=value` pairs from every `Cookie` header, in order.
/// Values wrapped in double quotes are unwrapped.
fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.trim().to_owned(), value.to_owned()))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(builder: http::request::Builder, body: &'static [u8]) -> Request {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(parts, Bytes::from_static(body), HashMap::new())
    }

    #[test]
    fn query_values_are_decoded() {
        let req = request(http::Request::get("/hello?name=Lev+Tempest&x=%2F"), b"");
        assert_eq!(req.query("name"), Some("Lev Tempest"));
        assert_eq!(req.query("x"), Some("/"));
        assert_eq!(req.query_or("missing", "guest"), "guest");
        assert_eq!(req.path(), "/hello");
    }

    #[test]
    fn empty_query_value_falls_back() {
        let req = request(http::Request::get("/hello?name=&lang=id"), b"");
        assert_eq!(req.query("name"), Some(""));
        assert_eq!(req.query_or("name", "guest"), "guest");
        assert_eq!(req.query_or("lang", "en"), "id");
    }

    #[test]
    fn headers_and_cookies() {
        let req = request(
            http::Request::get("/request")
                .header("firstname", "Lev")
                .header("cookie", "lastname=Tempest; theme=\"dark\"")
                .header("cookie", "lang=id"),
            b"",
        );
        assert_eq!(req.header("FirstName"), Some("Lev"));
        assert_eq!(req.cookie("lastname"), Some("Tempest"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("lang"), Some("id"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[tokio::test]
    async fn form_value_from_urlencoded_body() {
        let req = request(
            http::Request::post("/hello").header("content-type", "application/x-www-form-urlencoded"),
            b"name=Lev",
        );
        assert_eq!(req.form_value("name").await.unwrap().as_deref(), Some("Lev"));
        assert_eq!(req.form_value("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn form_file_missing_is_reported() {
        let req = request(
            http::Request::post("/upload").header("content-type", "multipart/form-data; boundary=b"),
            b"--b\r\ncontent-disposition: form-data; name=\"name\"\r\n\r\nLev\r\n--b--\r\n",
        );
        assert_eq!(req.form_value("name").await.unwrap().as_deref(), Some("Lev"));
        let err = req.form_file("file").await.unwrap_err();
        assert!(matches!(err, Error::MissingFormFile(ref f) if f == "file"));
    }

    #[tokio::test]
    async fn multipart_on_json_body_is_unsupported() {
        let req = request(http::Request::post("/upload").header("content-type", "application/json"), b"{}");
        let err = req.multipart().await.unwrap_err();
        assert_eq!(err.status(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
